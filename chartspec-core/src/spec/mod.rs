pub mod parse;

use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt::{Display, Formatter};

pub use parse::{parse, serialize, ParsedSpec, SpecError, SpecErrorKind};

pub const VEGA_SCHEMA: &str = "https://vega.github.io/schema/vega/v5.json";
pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Substring of a `$schema` URL that marks a dialect (Vega-Lite) document
pub const DIALECT_SCHEMA_MARKER: &str = "vega-lite";

/// Textual serialization format of a spec
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Notation {
    /// Bracket-based notation
    Json,
    /// Indentation-based notation
    #[default]
    Yaml,
}

impl Notation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Notation::Json => "json",
            Notation::Yaml => "yaml",
        }
    }
}

impl Display for Notation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Abstraction level of a spec: the low-level grammar or the dialect that compiles to it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    #[serde(rename = "vega")]
    Vega,
    #[default]
    #[serde(rename = "vega-lite")]
    VegaLite,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Vega => "vega",
            Dialect::VegaLite => "vega-lite",
        }
    }

    pub fn schema(&self) -> &'static str {
        match self {
            Dialect::Vega => VEGA_SCHEMA,
            Dialect::VegaLite => VEGA_LITE_SCHEMA,
        }
    }

    /// Document shown when there is nothing usable to show
    pub fn default_document(&self) -> Value {
        match self {
            Dialect::Vega => json!({"$schema": VEGA_SCHEMA}),
            Dialect::VegaLite => json!({
                "$schema": VEGA_LITE_SCHEMA,
                "data": {"values": []},
                "mark": "point"
            }),
        }
    }

    /// Infer the dialect of a parsed document from its `$schema` key.
    ///
    /// Documents without a `$schema` are taken to be dialect documents.
    pub fn infer(spec: &Value) -> Dialect {
        match spec.get("$schema") {
            Some(Value::String(schema)) if !schema.contains(DIALECT_SCHEMA_MARKER) => Dialect::Vega,
            _ => Dialect::VegaLite,
        }
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted configuration of one visualization instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisualizationOptions {
    pub notation: Notation,
    pub dialect: Dialect,
    pub spec_text: String,
    pub theme: Theme,

    /// Keys written by other versions, kept so they survive a save
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VisualizationOptions {
    pub fn new<S: Into<String>>(spec_text: S, notation: Notation, dialect: Dialect) -> Self {
        Self {
            notation,
            dialect,
            spec_text: spec_text.into(),
            ..Default::default()
        }
    }
}
