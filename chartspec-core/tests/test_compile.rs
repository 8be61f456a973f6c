use chartspec_core::compile::compile;
use chartspec_core::query::{ColumnType, QueryColumn, QueryMetadata};
use chartspec_core::spec::{Dialect, SpecErrorKind, VEGA_SCHEMA};
use chartspec_core::synthesize::{assign_roles, synthesize};
use chartspec_core::theme::Theme;
use rstest::rstest;
use serde_json::{json, Value};

fn dialect_doc(mark: &str) -> Value {
    json!({
        "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
        "data": {"values": [
            {"k": "a", "t": "2024-01-01", "v": 1, "s": "x"},
            {"k": "b", "t": "2024-01-02", "v": 3, "s": "y"}
        ]},
        "mark": mark,
        "encoding": {
            "x": {"field": "k", "type": "nominal"},
            "y": {"field": "v", "type": "quantitative"},
            "color": {"field": "s", "type": "nominal"}
        }
    })
}

mod test_autosize_invariant {
    use crate::*;

    #[rstest(
        mark,
        case("bar"),
        case("line"),
        case("area"),
        case("point"),
        case("circle"),
        case("square"),
        case("tick"),
        case("rule"),
        case("rect"),
        case("text")
    )]
    fn test(mark: &str) {
        let compiled = compile(&dialect_doc(mark), Theme::Custom);
        assert_eq!(compiled.error, None);
        assert_eq!(compiled.dialect, Dialect::Vega);
        assert_eq!(compiled.spec["$schema"], json!(VEGA_SCHEMA));
        assert!(compiled.spec.get("width").is_none());
        assert!(compiled.spec.get("height").is_none());
        assert!(!compiled.spec["marks"].as_array().unwrap().is_empty());
    }
}

mod test_grammar_idempotence {
    use crate::*;

    #[rstest(
        theme,
        case(Theme::Custom),
        case(Theme::Dark),
        case(Theme::Excel),
        case(Theme::FiveThirtyEight),
        case(Theme::Ggplot2),
        case(Theme::GoogleCharts),
        case(Theme::LaTimes),
        case(Theme::Quartz),
        case(Theme::UrbanInstitute),
        case(Theme::Vox)
    )]
    fn test(theme: Theme) {
        let grammar = json!({
            "$schema": VEGA_SCHEMA,
            "width": 100,
            "marks": [],
            "config": {"background": "#abc", "axis": {"labelFontSize": 99}}
        });
        let once = compile(&grammar, theme);
        let twice = compile(&once.spec, theme);
        assert_eq!(once, twice);
        assert_eq!(once.spec["config"]["background"], json!("#abc"));
        assert_eq!(once.spec["config"]["axis"]["labelFontSize"], json!(99));
        assert_eq!(once.spec["width"], json!(100));
    }
}

mod test_compile_errors {
    use crate::*;

    #[rstest(
        doc,
        case(json!({"hconcat": [{"mark": "bar"}]})),
        case(json!({"facet": {"row": {"field": "a"}}, "spec": {"mark": "bar"}})),
        case(json!({"data": {"values": []}})),
        case(json!({"mark": "arc"})),
        case(json!({"mark": "bar", "encoding": {"y": {"field": "v", "aggregate": "mode"}}}))
    )]
    fn test(doc: Value) {
        let compiled = compile(&doc, Theme::Custom);
        assert_eq!(compiled.spec, doc);
        assert_eq!(compiled.dialect, Dialect::VegaLite);
        assert_eq!(compiled.error.unwrap().kind, SpecErrorKind::Compile);
    }
}

mod test_synthesized_documents_compile {
    use crate::*;

    #[rstest(
        columns,
        mark,
        case(vec![("day", ColumnType::Date), ("count", ColumnType::Integer)], "line"),
        case(vec![("day", ColumnType::Date), ("a", ColumnType::Integer), ("b", ColumnType::Integer)], "line"),
        case(vec![("country", ColumnType::String), ("n", ColumnType::Float)], "point"),
        case(vec![("region", ColumnType::String), ("q1", ColumnType::Float), ("q2", ColumnType::Float)], "bar"),
        case(vec![("a", ColumnType::Integer), ("b", ColumnType::Integer)], "bar"),
        case(vec![("status", ColumnType::String)], "bar")
    )]
    fn test(columns: Vec<(&str, ColumnType)>, mark: &str) {
        let columns = columns
            .into_iter()
            .map(|(name, type_)| QueryColumn::new(name, type_))
            .collect::<Vec<_>>();
        let doc = synthesize(&columns, &QueryMetadata::default());
        assert_eq!(doc["mark"]["type"], json!(mark));

        // Same columns, same roles
        assert_eq!(assign_roles(&columns), assign_roles(&columns.clone()));

        let compiled = compile(&doc, Theme::Custom);
        assert_eq!(compiled.error, None, "{doc}");
        assert!(compiled.spec.get("width").is_none());
        assert_eq!(compiled.spec["data"][0], json!({"name": "query_results"}));
    }
}

#[test]
fn test_multi_metric_folds_into_series() {
    let columns = vec![
        QueryColumn::new("day", ColumnType::Date),
        QueryColumn::new("a", ColumnType::Integer),
        QueryColumn::new("b", ColumnType::Integer),
    ];
    let compiled = compile(
        &synthesize(&columns, &QueryMetadata::default()),
        Theme::Custom,
    );
    let transform = &compiled.spec["data"][1]["transform"];
    assert_eq!(
        transform[0],
        json!({"type": "fold", "fields": ["a", "b"], "as": ["series", "value"]})
    );
    assert_eq!(
        compiled.spec["marks"][0]["from"]["facet"]["groupby"],
        json!(["series"])
    );
}
