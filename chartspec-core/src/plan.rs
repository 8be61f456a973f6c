//! Everything the renderer needs for one frame, derived from the persisted options and the
//! current container size.
use crate::compile::compile;
use crate::layout::{render_size, LayoutConfig, LayoutContext, ParentSize};
use crate::query::{QueryColumn, QueryMetadata};
use crate::spec::{parse, Dialect, SpecError, VisualizationOptions};
use crate::synthesize::{synthesize, QUERY_RESULTS_DATASET};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPlan {
    pub error: Option<SpecError>,
    pub dialect: Dialect,
    pub spec: Value,
    pub autoresize: bool,
    pub width: f64,
    pub height: f64,
}

/// Payload handed to the external renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderHandoff {
    pub spec: Value,
    pub width: f64,
    pub height: f64,
}

impl RenderPlan {
    /// Renderer payload with the query rows bound to the document
    pub fn handoff(&self, rows: &[Map<String, Value>]) -> RenderHandoff {
        RenderHandoff {
            spec: bind_query_data(&self.spec, rows),
            width: self.width,
            height: self.height,
        }
    }
}

/// Query data shared by every plan of one renderer
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'a> {
    pub columns: &'a [QueryColumn],
    pub metadata: &'a QueryMetadata,
}

pub fn derive_render_plan(
    options: &VisualizationOptions,
    parent_size: &ParentSize,
    context: LayoutContext,
    query: QueryContext<'_>,
    config: &LayoutConfig,
) -> RenderPlan {
    let (parse_error, spec) =
        if options.spec_text.trim().is_empty() && !query.columns.is_empty() {
            (None, synthesize(query.columns, query.metadata))
        } else {
            let parsed = parse(&options.spec_text, Some(options.notation), options.dialect);
            (parsed.error, parsed.spec)
        };

    let compiled = compile(&spec, options.theme);
    let size = render_size(&compiled.spec, parent_size, context, config);

    RenderPlan {
        error: parse_error.or(compiled.error),
        dialect: compiled.dialect,
        spec: compiled.spec,
        autoresize: size.autoresize,
        width: size.width,
        height: size.height,
    }
}

/// Fill datasets named after the query results that have no inline values or url.
/// `rows` are copied, never modified.
pub fn bind_query_data(spec: &Value, rows: &[Map<String, Value>]) -> Value {
    let mut spec = spec.clone();
    let values = Value::Array(rows.iter().cloned().map(Value::Object).collect());
    match spec.get_mut("data") {
        Some(Value::Array(datasets)) => {
            for dataset in datasets.iter_mut() {
                bind_dataset(dataset, &values);
            }
        }
        Some(dataset @ Value::Object(_)) => bind_dataset(dataset, &values),
        _ => {}
    }
    spec
}

fn bind_dataset(dataset: &mut Value, values: &Value) {
    let Value::Object(obj) = dataset else {
        return;
    };
    let is_query_results = obj.get("name").and_then(Value::as_str) == Some(QUERY_RESULTS_DATASET);
    if is_query_results && !obj.contains_key("values") && !obj.contains_key("url") {
        obj.insert("values".to_string(), values.clone());
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PlanKey {
    options: VisualizationOptions,
    parent_size: ParentSize,
    context: LayoutContext,
    columns: Vec<QueryColumn>,
    metadata: QueryMetadata,
    config: LayoutConfig,
}

/// Single-entry cache of the last plan of one renderer, keyed by value equality of the inputs
#[derive(Debug, Clone, Default)]
pub struct RenderPlanCache {
    entry: Option<(PlanKey, RenderPlan)>,
    derivations: usize,
}

impl RenderPlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_derive(
        &mut self,
        options: &VisualizationOptions,
        parent_size: &ParentSize,
        context: LayoutContext,
        query: QueryContext<'_>,
        config: &LayoutConfig,
    ) -> &RenderPlan {
        let key = PlanKey {
            options: options.clone(),
            parent_size: *parent_size,
            context,
            columns: query.columns.to_vec(),
            metadata: query.metadata.clone(),
            config: config.clone(),
        };
        if !matches!(&self.entry, Some((cached, _)) if *cached == key) {
            self.entry = None;
        }
        let derivations = &mut self.derivations;
        let (_, plan) = self.entry.get_or_insert_with(|| {
            *derivations += 1;
            let plan = derive_render_plan(options, parent_size, context, query, config);
            (key, plan)
        });
        plan
    }

    /// Number of plans derived so far
    pub fn derivations(&self) -> usize {
        self.derivations
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ColumnType;
    use crate::spec::parse::EMPTY_SPEC_MESSAGE;
    use crate::spec::{Notation, SpecErrorKind};
    use crate::theme::Theme;
    use serde_json::json;

    fn columns() -> Vec<QueryColumn> {
        vec![
            QueryColumn::new("day", ColumnType::Date),
            QueryColumn::new("count", ColumnType::Integer),
        ]
    }

    #[test]
    fn test_blank_spec_uses_synthesized_document() {
        let columns = columns();
        let metadata = QueryMetadata::default();
        let plan = derive_render_plan(
            &VisualizationOptions::default(),
            &ParentSize::new(600.0, 400.0),
            LayoutContext::Widget,
            QueryContext {
                columns: &columns,
                metadata: &metadata,
            },
            &LayoutConfig::default(),
        );
        assert!(plan.error.is_none());
        assert_eq!(plan.dialect, Dialect::Vega);
        assert!(plan.autoresize);
        assert_eq!((plan.width, plan.height), (560.0, 390.0));
        assert!(plan.spec.get("width").is_none());
        assert_eq!(plan.spec["data"][0], json!({"name": "query_results"}));
    }

    #[test]
    fn test_blank_spec_without_columns_is_an_error() {
        let metadata = QueryMetadata::default();
        let plan = derive_render_plan(
            &VisualizationOptions::default(),
            &ParentSize::new(600.0, 400.0),
            LayoutContext::Query,
            QueryContext {
                columns: &[],
                metadata: &metadata,
            },
            &LayoutConfig::default(),
        );
        let error = plan.error.unwrap();
        assert_eq!(error.kind, SpecErrorKind::Parse);
        assert_eq!(error.message, EMPTY_SPEC_MESSAGE);
    }

    #[test]
    fn test_cache_hits_on_equal_inputs() {
        let columns = columns();
        let metadata = QueryMetadata::default();
        let query = QueryContext {
            columns: &columns,
            metadata: &metadata,
        };
        let config = LayoutConfig::default();
        let mut options =
            VisualizationOptions::new("mark: point\n", Notation::Yaml, Dialect::VegaLite);
        let mut cache = RenderPlanCache::new();

        let size = ParentSize::new(500.0, 300.0);
        cache.get_or_derive(&options, &size, LayoutContext::Widget, query, &config);
        cache.get_or_derive(&options, &size, LayoutContext::Widget, query, &config);
        assert_eq!(cache.derivations(), 1);

        options.theme = Theme::Dark;
        let plan = cache.get_or_derive(&options, &size, LayoutContext::Widget, query, &config);
        assert_eq!(plan.spec["config"]["background"], json!("#333"));
        assert_eq!(cache.derivations(), 2);
    }

    #[test]
    fn test_cache_misses_on_layout_config_change() {
        let columns = columns();
        let metadata = QueryMetadata::default();
        let query = QueryContext {
            columns: &columns,
            metadata: &metadata,
        };
        let options =
            VisualizationOptions::new("{\"mark\": \"bar\"}", Notation::Json, Dialect::VegaLite);
        let size = ParentSize::new(500.0, 300.0);
        let mut cache = RenderPlanCache::new();

        let mut config = LayoutConfig::default();
        let width = cache
            .get_or_derive(&options, &size, LayoutContext::Widget, query, &config)
            .width;
        assert_eq!(width, 460.0);

        config.widget_horizontal_padding = 100.0;
        let plan = cache.get_or_derive(&options, &size, LayoutContext::Widget, query, &config);
        assert_eq!(plan.width, 390.0);
        assert_eq!(cache.derivations(), 2);
    }

    #[test]
    fn test_bind_query_data() {
        let rows = vec![json!({"day": "2024-01-01", "count": 3})
            .as_object()
            .cloned()
            .unwrap()];
        let spec = json!({
            "data": [
                {"name": "query_results"},
                {"name": "query_results", "url": "data.csv"},
                {"name": "data_0", "source": "query_results"}
            ]
        });
        let bound = bind_query_data(&spec, &rows);
        assert_eq!(bound["data"][0]["values"][0]["count"], json!(3));
        assert!(bound["data"][1].get("values").is_none());
        assert!(bound["data"][2].get("values").is_none());

        let handoff = RenderPlan {
            error: None,
            dialect: Dialect::Vega,
            spec,
            autoresize: true,
            width: 10.0,
            height: 20.0,
        }
        .handoff(&rows);
        assert_eq!(handoff.spec, bound);
    }
}
