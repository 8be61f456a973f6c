//! Typed view of the single-view dialect documents the transform accepts
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Distinguish an explicit `null` (`Some(None)`) from an absent key (`None`)
fn explicit_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteSpec {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<LiteData>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transform: Vec<LiteTransform>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark: Option<LiteMark>,

    #[serde(default)]
    pub encoding: LiteEncoding,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autosize: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteTransform {
    Fold {
        fold: Vec<String>,
        #[serde(rename = "as", default, skip_serializing_if = "Option::is_none")]
        as_: Option<Vec<String>>,
    },
    Calculate {
        calculate: String,
        #[serde(rename = "as")]
        as_: String,
    },
    Filter {
        filter: LiteFilter,
    },
    Aggregate {
        aggregate: Vec<AggregateOpDef>,
        #[serde(default)]
        groupby: Vec<String>,
    },
    Unsupported(Map<String, Value>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteFilter {
    Expr(String),
    Equal { field: String, equal: Value },
    OneOf {
        field: String,
        #[serde(rename = "oneOf")]
        one_of: Vec<Value>,
    },
    Range { field: String, range: [Value; 2] },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateOpDef {
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(rename = "as")]
    pub as_: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteMark {
    Type(String),
    Def(MarkDef),
}

impl LiteMark {
    pub fn type_(&self) -> &str {
        match self {
            LiteMark::Type(type_) => type_,
            LiteMark::Def(def) => &def.type_,
        }
    }

    pub fn props(&self) -> Map<String, Value> {
        match self {
            LiteMark::Type(_) => Map::new(),
            LiteMark::Def(def) => def.props.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkDef {
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(flatten)]
    pub props: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Quantitative,
    Temporal,
    Nominal,
    Ordinal,
}

impl FieldType {
    pub fn is_discrete(&self) -> bool {
        matches!(self, FieldType::Nominal | FieldType::Ordinal)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<FieldType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// `null`/`false` disables stacking, `"normalize"` stacks to 100%
    #[serde(
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub stack: Option<Option<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Map<String, Value>>,

    /// `null` hides the axis
    #[serde(
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub axis: Option<Option<Map<String, Value>>>,

    /// `null` hides the legend
    #[serde(
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub legend: Option<Option<Map<String, Value>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TooltipDef {
    Single(ChannelDef),
    Many(Vec<ChannelDef>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiteEncoding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<ChannelDef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<ChannelDef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ChannelDef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<ChannelDef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<ChannelDef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<ChannelDef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<ChannelDef>,

    #[serde(rename = "xOffset", default, skip_serializing_if = "Option::is_none")]
    pub x_offset: Option<ChannelDef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<TooltipDef>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
