pub mod lite;

use crate::spec::{Dialect, SpecError};
use crate::theme::{apply_theme, Theme};
use serde_json::Value;

const SIZE_KEYS: [&str; 2] = ["width", "height"];

/// Result of compiling a document to the renderer-ready grammar
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    /// Grammar document, or the input document as-is when compilation failed
    pub spec: Value,
    /// Dialect of `spec`
    pub dialect: Dialect,
    pub error: Option<SpecError>,
}

/// Apply the theme and lower dialect documents to the grammar.
///
/// Grammar documents only receive the theme. Dialect documents keep `width`/`height`
/// absent after compilation when they were not declared as numbers, so the layout engine
/// sizes them from the container.
pub fn compile(doc: &Value, theme: Theme) -> Compiled {
    let dialect = Dialect::infer(doc);
    let mut spec = doc.clone();
    apply_theme(&mut spec, theme);

    if dialect == Dialect::Vega {
        return Compiled {
            spec,
            dialect,
            error: None,
        };
    }

    let declared = SIZE_KEYS.map(|key| declared_size(&spec, key));
    match lite::compile_lite(&spec) {
        Ok(mut compiled) => {
            if let Value::Object(obj) = &mut compiled {
                for (key, declared) in SIZE_KEYS.iter().zip(declared) {
                    match declared {
                        Some(size) => {
                            obj.insert(key.to_string(), size);
                        }
                        None => {
                            obj.remove(*key);
                        }
                    }
                }
            }
            Compiled {
                spec: compiled,
                dialect: Dialect::Vega,
                error: None,
            }
        }
        Err(err) => {
            log::warn!("Failed to compile spec, showing it uncompiled: {err}");
            Compiled {
                spec: doc.clone(),
                dialect,
                error: Some(SpecError::compile(err.message())),
            }
        }
    }
}

/// Numeric size declared on the document. `"container"` and step objects count as undeclared.
fn declared_size(doc: &Value, key: &str) -> Option<Value> {
    match doc.get(key) {
        Some(size @ Value::Number(_)) => Some(size.clone()),
        Some(other) => {
            log::debug!("Treating {key} = {other} as container-derived");
            None
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{SpecErrorKind, VEGA_LITE_SCHEMA, VEGA_SCHEMA};
    use serde_json::json;

    fn bar_chart() -> Value {
        json!({
            "$schema": VEGA_LITE_SCHEMA,
            "data": {"values": [{"a": "A", "b": 1}]},
            "mark": "bar",
            "encoding": {
                "x": {"field": "a", "type": "nominal"},
                "y": {"field": "b", "type": "quantitative"}
            }
        })
    }

    #[test]
    fn test_autosize_rule_removes_undeclared_size() {
        let compiled = compile(&bar_chart(), Theme::Custom);
        assert_eq!(compiled.dialect, Dialect::Vega);
        assert!(compiled.error.is_none());
        assert_eq!(compiled.spec["$schema"], json!(VEGA_SCHEMA));
        assert!(compiled.spec.get("width").is_none());
        assert!(compiled.spec.get("height").is_none());
    }

    #[test]
    fn test_declared_size_is_restored() {
        let mut doc = bar_chart();
        doc["width"] = json!(450);
        doc["height"] = json!("container");
        let compiled = compile(&doc, Theme::Custom);
        assert_eq!(compiled.spec["width"], json!(450));
        assert!(compiled.spec.get("height").is_none());
    }

    #[test]
    fn test_theme_applied_before_compilation() {
        let mut doc = bar_chart();
        doc["config"] = json!({"background": "#fff"});
        let compiled = compile(&doc, Theme::Dark);
        assert_eq!(compiled.spec["config"]["background"], json!("#fff"));
        assert!(compiled.spec["config"].get("title").is_some());
    }

    #[test]
    fn test_grammar_is_idempotent() {
        let grammar = json!({
            "$schema": VEGA_SCHEMA,
            "marks": [],
            "config": {"axis": {"grid": false}}
        });
        let once = compile(&grammar, Theme::Vox);
        let twice = compile(&once.spec, Theme::Vox);
        assert_eq!(once, twice);
        assert_eq!(once.dialect, Dialect::Vega);
    }

    #[test]
    fn test_compile_failure_keeps_document() {
        let doc = json!({"$schema": VEGA_LITE_SCHEMA, "layer": []});
        let compiled = compile(&doc, Theme::Custom);
        assert_eq!(compiled.spec, doc);
        assert_eq!(compiled.dialect, Dialect::VegaLite);
        assert_eq!(compiled.error.unwrap().kind, SpecErrorKind::Compile);
    }

    #[test]
    fn test_compile_failure_is_not_themed() {
        let doc = json!({"$schema": VEGA_LITE_SCHEMA, "mark": "arc"});
        let compiled = compile(&doc, Theme::Dark);
        assert_eq!(compiled.spec, doc);
        assert!(compiled.spec.get("config").is_none());
    }
}
