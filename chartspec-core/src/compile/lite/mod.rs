//! Single-view subset of the Vega-Lite grammar lowered to a full Vega document.
//!
//! Composite views (`layer`, `concat`, `facet`, `repeat`) are rejected with a
//! compilation error rather than partially rendered.
pub mod encoding;
pub mod mark;
pub mod spec;

use crate::compile::lite::encoding::{
    build_axes, build_legends, build_scales, stack_transform, ResolvedEncoding,
};
use crate::compile::lite::mark::{build_marks, is_filled, MarkType};
use crate::compile::lite::spec::{LiteData, LiteFilter, LiteSpec, LiteTransform};
use crate::spec::VEGA_SCHEMA;
use chartspec_common::error::{ChartSpecError, Result, ResultWithContext};
use chartspec_common::escape::{datum_accessor, unescape_field};
use itertools::Itertools;
use serde_json::{json, Map, Value};

pub const DEFAULT_VIEW_WIDTH: f64 = 200.0;
pub const DEFAULT_VIEW_HEIGHT: f64 = 200.0;
pub const MAIN_DATA: &str = "data_0";

const COMPOSITE_KEYS: &[&str] = &[
    "layer", "concat", "hconcat", "vconcat", "facet", "repeat", "spec",
];

/// Lower a single-view document to Vega
pub fn compile_lite(doc: &Value) -> Result<Value> {
    let Value::Object(obj) = doc else {
        return Err(ChartSpecError::compilation("Spec must be an object"));
    };
    if let Some(key) = COMPOSITE_KEYS.iter().find(|k| obj.contains_key(**k)) {
        return Err(ChartSpecError::compilation(format!(
            "Composite views ({key:?}) are not supported"
        )));
    }

    let lite: LiteSpec = serde_json::from_value(doc.clone())
        .map_err(|err| ChartSpecError::compilation(err.to_string()))?;

    let mark = lite
        .mark
        .as_ref()
        .ok_or_else(|| ChartSpecError::compilation("Spec has no mark"))?;
    let mark_type = MarkType::parse(mark.type_())?;
    let props = mark.props();
    let encoding = ResolvedEncoding::resolve(&lite.encoding)
        .with_context(|| format!("Failed to compile {} mark encoding", mark_type.name()))?;

    let mut transforms = Vec::new();
    for transform in &lite.transform {
        transforms.extend(lower_transform(transform)?);
    }
    for field in encoding.temporal_source_fields() {
        transforms.push(json!({
            "type": "formula",
            "expr": format!("toDate({})", datum_accessor(&field)),
            "as": unescape_field(&field),
        }));
    }
    if let Some(aggregate) = encoding.aggregate_transform() {
        transforms.push(aggregate);
    }
    let stack = stack_transform(mark_type, &encoding);
    if let Some((transform, _)) = &stack {
        transforms.push(transform.clone());
    }
    let stack = stack.map(|(_, info)| info);

    let data = build_data(lite.data.as_ref(), transforms);
    let filled = is_filled(mark_type, &props);

    let mut vega = Map::new();
    vega.insert("$schema".to_string(), json!(VEGA_SCHEMA));
    if let Some(description) = &lite.description {
        vega.insert("description".to_string(), json!(description));
    }
    if let Some(title) = &lite.title {
        let title = match title {
            Value::String(text) => json!({"text": text}),
            other => other.clone(),
        };
        vega.insert("title".to_string(), title);
    }
    if let Some(background) = &lite.background {
        vega.insert("background".to_string(), background.clone());
    }
    vega.insert(
        "padding".to_string(),
        lite.padding.clone().unwrap_or(json!(5)),
    );
    vega.insert(
        "autosize".to_string(),
        lite.autosize.clone().unwrap_or(json!("pad")),
    );
    vega.insert(
        "width".to_string(),
        view_size(lite.width.as_ref(), DEFAULT_VIEW_WIDTH),
    );
    vega.insert(
        "height".to_string(),
        view_size(lite.height.as_ref(), DEFAULT_VIEW_HEIGHT),
    );
    vega.insert("style".to_string(), json!("cell"));
    vega.insert("data".to_string(), Value::Array(data));
    vega.insert(
        "marks".to_string(),
        Value::Array(build_marks(
            mark_type,
            &props,
            &encoding,
            stack.as_ref(),
            MAIN_DATA,
        )),
    );
    vega.insert(
        "scales".to_string(),
        Value::Array(build_scales(mark_type, &encoding, stack.as_ref(), MAIN_DATA)),
    );
    vega.insert("axes".to_string(), Value::Array(build_axes(&encoding)));

    let legends = build_legends(mark_type, filled, &encoding);
    if !legends.is_empty() {
        vega.insert("legends".to_string(), Value::Array(legends));
    }
    if let Some(config) = &lite.config {
        vega.insert("config".to_string(), config.clone());
    }

    Ok(Value::Object(vega))
}

fn view_size(size: Option<&Value>, default: f64) -> Value {
    match size {
        Some(Value::Number(n)) => Value::Number(n.clone()),
        Some(other) => {
            log::warn!("Non-numeric view size {other} replaced by {default}");
            json!(default)
        }
        None => json!(default),
    }
}

fn build_data(source: Option<&LiteData>, transform: Vec<Value>) -> Vec<Value> {
    let named = source.and_then(|data| data.name.clone());
    match named {
        Some(name) => {
            // Named datasets are bound at view time, derive the main dataset from them
            vec![
                json!({"name": name}),
                json!({"name": MAIN_DATA, "source": name, "transform": transform}),
            ]
        }
        None => {
            let mut main = Map::new();
            main.insert("name".to_string(), json!(MAIN_DATA));
            if let Some(source) = source {
                if let Some(values) = &source.values {
                    main.insert("values".to_string(), values.clone());
                }
                if let Some(url) = &source.url {
                    main.insert("url".to_string(), json!(url));
                }
                if let Some(format) = &source.format {
                    main.insert("format".to_string(), format.clone());
                }
            } else {
                main.insert("values".to_string(), json!([]));
            }
            main.insert("transform".to_string(), Value::Array(transform));
            vec![Value::Object(main)]
        }
    }
}

fn lower_transform(transform: &LiteTransform) -> Result<Vec<Value>> {
    Ok(match transform {
        LiteTransform::Fold { fold, as_ } => {
            let as_ = as_
                .clone()
                .unwrap_or_else(|| vec!["key".to_string(), "value".to_string()]);
            vec![json!({"type": "fold", "fields": fold, "as": as_})]
        }
        LiteTransform::Calculate { calculate, as_ } => {
            vec![json!({"type": "formula", "expr": calculate, "as": as_})]
        }
        LiteTransform::Filter { filter } => {
            vec![json!({"type": "filter", "expr": filter_expr(filter)})]
        }
        LiteTransform::Aggregate { aggregate, groupby } => {
            vec![json!({
                "type": "aggregate",
                "groupby": groupby,
                "ops": aggregate.iter().map(|op| op.op.clone()).collect_vec(),
                "fields": aggregate.iter().map(|op| json!(op.field)).collect_vec(),
                "as": aggregate.iter().map(|op| op.as_.clone()).collect_vec(),
            })]
        }
        LiteTransform::Unsupported(transform) => {
            return Err(ChartSpecError::compilation(format!(
                "Unsupported transform with keys: {}",
                transform.keys().join(", ")
            )))
        }
    })
}

fn filter_expr(filter: &LiteFilter) -> String {
    match filter {
        LiteFilter::Expr(expr) => expr.clone(),
        LiteFilter::Equal { field, equal } => {
            format!("{} === {}", datum_accessor(field), equal)
        }
        LiteFilter::OneOf { field, one_of } => {
            format!(
                "indexof({}, {}) !== -1",
                Value::Array(one_of.clone()),
                datum_accessor(field)
            )
        }
        LiteFilter::Range { field, range } => {
            let accessor = datum_accessor(field);
            let mut clauses = Vec::new();
            if !range[0].is_null() {
                clauses.push(format!("{} <= {}", range[0], accessor));
            }
            if !range[1].is_null() {
                clauses.push(format!("{} <= {}", accessor, range[1]));
            }
            if clauses.is_empty() {
                "true".to_string()
            } else {
                clauses.join(" && ")
            }
        }
    }
}
