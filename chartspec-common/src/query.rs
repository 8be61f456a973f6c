use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

/// Declared type of a query result column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    String,
    Datetime,
    Date,
    Other(String),
}

impl ColumnType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnType::Datetime | ColumnType::Date)
    }
}

impl From<String> for ColumnType {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "integer" => ColumnType::Integer,
            "float" => ColumnType::Float,
            "boolean" => ColumnType::Boolean,
            "string" => ColumnType::String,
            "datetime" => ColumnType::Datetime,
            "date" => ColumnType::Date,
            _ => ColumnType::Other(value),
        }
    }
}

impl From<ColumnType> for String {
    fn from(value: ColumnType) -> Self {
        value.to_string()
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::String => "string",
            ColumnType::Datetime => "datetime",
            ColumnType::Date => "date",
            ColumnType::Other(other) => other.as_str(),
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryColumn {
    pub name: String,

    #[serde(rename = "type", default)]
    pub type_: Option<ColumnType>,

    #[serde(
        rename = "friendly_name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub friendly_name: Option<String>,
}

impl QueryColumn {
    pub fn new<S: Into<String>>(name: S, type_: ColumnType) -> Self {
        Self {
            name: name.into(),
            type_: Some(type_),
            friendly_name: None,
        }
    }
}

/// Result of executing a query: column metadata plus row objects keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub columns: Vec<QueryColumn>,

    #[serde(default)]
    pub rows: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default)]
    pub name: String,

    /// URL the query's latest result can be downloaded from as csv
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
}
