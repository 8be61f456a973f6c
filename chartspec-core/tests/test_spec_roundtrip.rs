use chartspec_core::spec::{parse, serialize, Dialect, Notation, SpecErrorKind};
use rstest::rstest;
use serde_json::{json, Value};

fn sample_specs() -> Vec<Value> {
    vec![
        json!({"mark": "bar"}),
        json!({
            "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
            "title": "Signups: daily",
            "data": {"values": [{"a": 1, "b": "x"}, {"a": 2.5, "b": null}]},
            "mark": {"type": "line", "tooltip": true},
            "encoding": {
                "x": {"field": "a", "type": "quantitative"},
                "y": {"field": "b", "type": "nominal", "axis": null}
            }
        }),
        json!({
            "$schema": "https://vega.github.io/schema/vega/v5.json",
            "marks": [],
            "signals": [{"name": "yes", "value": "no"}, {"name": "n", "value": "123"}]
        }),
    ]
}

mod test_round_trip {
    use crate::*;

    #[rstest(notation, case(Notation::Json), case(Notation::Yaml))]
    fn test(notation: Notation) {
        for spec in sample_specs() {
            let text = serialize(&spec, notation, "");
            let parsed = parse(&text, Some(notation), Dialect::VegaLite);
            assert_eq!(parsed.error, None, "{text}");
            assert_eq!(parsed.spec, spec, "{text}");
            assert_eq!(parsed.notation, notation);
        }
    }
}

mod test_autodetect {
    use crate::*;

    #[rstest(
        text,
        expected,
        case("{\"mark\": \"bar\"}", Notation::Json),
        case("mark: bar\n", Notation::Yaml),
        case("  {\"a\": [1, 2]}  \n", Notation::Json),
        case("a:\n  - 1\n  - 2\n", Notation::Yaml)
    )]
    fn test(text: &str, expected: Notation) {
        let parsed = parse(text, None, Dialect::VegaLite);
        assert_eq!(parsed.error, None);
        assert_eq!(parsed.notation, expected);
    }
}

mod test_dialect_inference {
    use crate::*;

    #[rstest(
        text,
        expected,
        case("{\"$schema\": \"https://vega.github.io/schema/vega-lite/v5.json\"}", Dialect::VegaLite),
        case("{\"$schema\": \"https://vega.github.io/schema/vega/v5.json\"}", Dialect::Vega),
        case("{\"mark\": \"point\"}", Dialect::VegaLite)
    )]
    fn test(text: &str, expected: Dialect) {
        assert_eq!(parse(text, None, Dialect::Vega).dialect, expected);
    }
}

mod test_recovery {
    use crate::*;

    #[rstest(
        text,
        dialect,
        case("", Dialect::VegaLite),
        case("   \n\t", Dialect::Vega),
        case("{\"mark\": ", Dialect::VegaLite),
        case("a: [", Dialect::Vega),
        case("- 1\n- 2\n", Dialect::VegaLite)
    )]
    fn test(text: &str, dialect: Dialect) {
        let parsed = parse(text, None, dialect);
        let error = parsed.error.expect("error expected");
        assert_eq!(error.kind, SpecErrorKind::Parse);
        assert!(!error.message.is_empty());
        assert_eq!(parsed.spec, dialect.default_document());
    }
}
