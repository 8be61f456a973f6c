use crate::spec::{Dialect, Notation};
use chartspec_common::error::{ChartSpecError, Result, ResultWithContext};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub const EMPTY_SPEC_MESSAGE: &str = "You entered an empty spec";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecErrorKind {
    /// Spec text could not be read in its notation
    Parse,
    /// Dialect document was rejected by the dialect-to-grammar transform
    Compile,
}

/// Recoverable error surfaced to the user as an inline warning
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct SpecError {
    pub kind: SpecErrorKind,
    pub message: String,
}

impl SpecError {
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self {
            kind: SpecErrorKind::Parse,
            message: message.into(),
        }
    }

    pub fn compile<S: Into<String>>(message: S) -> Self {
        Self {
            kind: SpecErrorKind::Compile,
            message: message.into(),
        }
    }
}

/// Outcome of parsing spec text. `spec` is always usable, even when `error` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSpec {
    pub error: Option<SpecError>,
    pub spec: Value,
    pub notation: Notation,
    pub dialect: Dialect,
}

/// Parse spec text.
///
/// With no `notation`, bracket notation is attempted first and indentation notation second.
/// On failure the returned spec is the default document of `dialect`.
pub fn parse(text: &str, notation: Option<Notation>, dialect: Dialect) -> ParsedSpec {
    if text.trim().is_empty() {
        return ParsedSpec {
            error: Some(SpecError::parse(EMPTY_SPEC_MESSAGE)),
            spec: dialect.default_document(),
            notation: notation.unwrap_or_default(),
            dialect,
        };
    }

    let attempt = match notation {
        Some(notation) => parse_notation(text, notation).map(|spec| (spec, notation)),
        None => match parse_notation(text, Notation::Json) {
            Ok(spec) => Ok((spec, Notation::Json)),
            Err(json_err) => match parse_notation(text, Notation::Yaml) {
                Ok(spec) => Ok((spec, Notation::Yaml)),
                Err(yaml_err) => {
                    // Report the failure of the notation the text most resembles
                    if looks_bracketed(text) {
                        Err(json_err)
                    } else {
                        Err(yaml_err)
                    }
                }
            },
        },
    };

    match attempt {
        Ok((spec, notation)) => {
            let dialect = Dialect::infer(&spec);
            ParsedSpec {
                error: None,
                spec,
                notation,
                dialect,
            }
        }
        Err(err) => {
            log::warn!("Failed to parse spec: {}", err.message());
            let notation = notation.unwrap_or(if looks_bracketed(text) {
                Notation::Json
            } else {
                Notation::Yaml
            });
            ParsedSpec {
                error: Some(SpecError::parse(err.message())),
                spec: dialect.default_document(),
                notation,
                dialect,
            }
        }
    }
}

/// Serialize a spec for display. Falls back to `original` when serialization fails.
pub fn serialize(spec: &Value, notation: Notation, original: &str) -> String {
    match try_serialize(spec, notation) {
        Ok(text) => text,
        Err(err) => {
            log::warn!("Failed to serialize spec as {notation}: {}", err.message());
            original.to_string()
        }
    }
}

pub fn try_serialize(spec: &Value, notation: Notation) -> Result<String> {
    match notation {
        Notation::Json => serde_json::to_string_pretty(spec)
            .with_context(|| "Failed to write spec in bracket notation"),
        Notation::Yaml => serde_yaml::to_string(spec)
            .with_context(|| "Failed to write spec in indentation notation"),
    }
}

fn parse_notation(text: &str, notation: Notation) -> Result<Value> {
    let spec: Value = match notation {
        Notation::Json => serde_json::from_str(text)?,
        Notation::Yaml => serde_yaml::from_str(text)?,
    };
    if spec.is_object() {
        Ok(spec)
    } else {
        Err(ChartSpecError::parse(format!(
            "Spec must be an object, found {}",
            value_kind(&spec)
        )))
    }
}

fn looks_bracketed(text: &str) -> bool {
    matches!(text.trim_start().chars().next(), Some('{') | Some('['))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{VEGA_LITE_SCHEMA, VEGA_SCHEMA};
    use serde_json::json;

    #[test]
    fn test_empty_spec_recovers_with_default_document() {
        let parsed = parse("  \n\t", None, Dialect::VegaLite);
        assert_eq!(parsed.error, Some(SpecError::parse(EMPTY_SPEC_MESSAGE)));
        assert_eq!(parsed.spec, Dialect::VegaLite.default_document());
        assert_eq!(parsed.dialect, Dialect::VegaLite);

        let parsed = parse("", Some(Notation::Json), Dialect::Vega);
        assert_eq!(parsed.error.unwrap().message, "You entered an empty spec");
        assert_eq!(parsed.spec, json!({"$schema": VEGA_SCHEMA}));
        assert_eq!(parsed.notation, Notation::Json);
    }

    #[test]
    fn test_autodetect_prefers_bracket_notation() {
        let parsed = parse(r#"{"mark": "bar"}"#, None, Dialect::Vega);
        assert_eq!(parsed.error, None);
        assert_eq!(parsed.notation, Notation::Json);
        assert_eq!(parsed.dialect, Dialect::VegaLite);
        assert_eq!(parsed.spec, json!({"mark": "bar"}));
    }

    #[test]
    fn test_autodetect_falls_back_to_indentation_notation() {
        let text = "$schema: https://vega.github.io/schema/vega/v5.json\nwidth: 300\n";
        let parsed = parse(text, None, Dialect::VegaLite);
        assert_eq!(parsed.error, None);
        assert_eq!(parsed.notation, Notation::Yaml);
        assert_eq!(parsed.dialect, Dialect::Vega);
        assert_eq!(parsed.spec, json!({"$schema": VEGA_SCHEMA, "width": 300}));
    }

    #[test]
    fn test_malformed_text_recovers() {
        let parsed = parse(r#"{"mark": "bar""#, None, Dialect::VegaLite);
        let error = parsed.error.unwrap();
        assert_eq!(error.kind, SpecErrorKind::Parse);
        assert_eq!(parsed.notation, Notation::Json);
        assert_eq!(parsed.spec, Dialect::VegaLite.default_document());
    }

    #[test]
    fn test_explicit_notation_is_not_second_guessed() {
        let parsed = parse("mark: bar", Some(Notation::Json), Dialect::VegaLite);
        assert!(parsed.error.is_some());
        assert_eq!(parsed.notation, Notation::Json);
    }

    #[test]
    fn test_scalar_document_is_rejected() {
        let parsed = parse("just some words", None, Dialect::VegaLite);
        let error = parsed.error.unwrap();
        assert!(error.message.contains("must be an object"), "{}", error.message);
        assert_eq!(parsed.notation, Notation::Yaml);
    }

    #[test]
    fn test_round_trip_both_notations() {
        let spec = json!({
            "$schema": VEGA_LITE_SCHEMA,
            "data": {"values": [{"a": "yes", "b": 1.5, "c": null}, {"a": "1", "b": -2}]},
            "mark": {"type": "bar", "tooltip": true},
            "encoding": {"x": {"field": "a", "type": "nominal"}}
        });
        for notation in [Notation::Json, Notation::Yaml] {
            let text = serialize(&spec, notation, "");
            let parsed = parse(&text, Some(notation), Dialect::Vega);
            assert_eq!(parsed.error, None, "{notation}: {text}");
            assert_eq!(parsed.spec, spec, "{notation}");
            assert_eq!(parsed.dialect, Dialect::VegaLite);
        }
    }

    #[test]
    fn test_serialize_preserves_key_order() {
        let spec = json!({"mark": "bar", "$schema": VEGA_LITE_SCHEMA});
        let text = serialize(&spec, Notation::Json, "");
        assert!(text.find("mark").unwrap() < text.find("$schema").unwrap());
    }
}
