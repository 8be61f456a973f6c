//! Heuristic seed document for a blank spec, built from the query's column metadata.
use crate::spec::VEGA_LITE_SCHEMA;
use chartspec_common::escape::escape_field;
use chartspec_common::query::{ColumnType, QueryColumn, QueryMetadata};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Name of the dataset the query rows are bound to when there is no export url
pub const QUERY_RESULTS_DATASET: &str = "query_results";
pub const SERIES_FIELD: &str = "series";
pub const VALUE_FIELD: &str = "value";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VegaType {
    Categorical,
    Quantitative,
    Temporal,
    Ordinal,
}

impl VegaType {
    pub fn from_column_type(type_: Option<&ColumnType>) -> Self {
        match type_ {
            Some(type_) if type_.is_numeric() => VegaType::Quantitative,
            Some(type_) if type_.is_temporal() => VegaType::Temporal,
            Some(ColumnType::Boolean) => VegaType::Ordinal,
            _ => VegaType::Categorical,
        }
    }

    /// Encoding `type` value in the dialect
    pub fn encoding_type(&self) -> &'static str {
        match self {
            VegaType::Categorical => "nominal",
            VegaType::Quantitative => "quantitative",
            VegaType::Temporal => "temporal",
            VegaType::Ordinal => "ordinal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Escaped field reference
    pub name: String,
    pub vega_type: VegaType,
    pub title: String,
}

impl FieldDescriptor {
    pub fn from_column(column: &QueryColumn) -> Self {
        Self {
            name: escape_field(&column.name),
            vega_type: VegaType::from_column_type(column.type_.as_ref()),
            title: column
                .friendly_name
                .clone()
                .unwrap_or_else(|| column.name.clone()),
        }
    }

    fn synthetic(name: &str, vega_type: VegaType) -> Self {
        Self {
            name: name.to_string(),
            vega_type,
            title: name.to_string(),
        }
    }

    pub fn encoding(&self) -> Value {
        json!({
            "field": self.name,
            "type": self.vega_type.encoding_type(),
            "title": self.title,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedMark {
    Line,
    Point,
    Bar,
}

impl SeedMark {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedMark::Line => "line",
            SeedMark::Point => "point",
            SeedMark::Bar => "bar",
        }
    }
}

/// Role assignment of query columns in the seed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRoles {
    pub x: Option<FieldDescriptor>,
    /// `None` when there is no numeric column, in which case rows are counted
    pub y: Option<FieldDescriptor>,
    pub color: Option<FieldDescriptor>,
    /// Numeric fields folded into `series`/`value` pairs when there is more than one
    pub series: Vec<String>,
    /// Discriminator that places bars of different series side by side
    pub offset: Option<FieldDescriptor>,
    pub mark: SeedMark,
}

pub fn assign_roles(columns: &[QueryColumn]) -> FieldRoles {
    let fields = columns.iter().map(FieldDescriptor::from_column).collect_vec();

    let temporal = fields
        .iter()
        .filter(|f| f.vega_type == VegaType::Temporal)
        .collect_vec();
    let numeric = fields
        .iter()
        .filter(|f| f.vega_type == VegaType::Quantitative)
        .collect_vec();
    let categorical = fields
        .iter()
        .filter(|f| matches!(f.vega_type, VegaType::Categorical | VegaType::Ordinal))
        .collect_vec();

    let mut x = temporal
        .first()
        .or_else(|| categorical.first())
        .map(|f| (*f).clone());
    let x_is_temporal = x
        .as_ref()
        .is_some_and(|f| f.vega_type == VegaType::Temporal);

    let first_other_categorical = || {
        categorical
            .iter()
            .find(|f| Some(f.name.as_str()) != x.as_ref().map(|x| x.name.as_str()))
            .map(|f| (*f).clone())
    };

    let (y, mut color, series) = if numeric.len() > 1 {
        let series = numeric.iter().map(|f| f.name.clone()).collect_vec();
        (
            Some(FieldDescriptor::synthetic(VALUE_FIELD, VegaType::Quantitative)),
            Some(FieldDescriptor::synthetic(SERIES_FIELD, VegaType::Categorical)),
            series,
        )
    } else {
        (
            numeric.first().map(|f| (*f).clone()),
            first_other_categorical(),
            Vec::new(),
        )
    };

    let mark = if x_is_temporal {
        SeedMark::Line
    } else if numeric.len() == 1 {
        SeedMark::Point
    } else {
        SeedMark::Bar
    };

    let mut offset = None;
    if mark == SeedMark::Bar && !series.is_empty() {
        let discriminator = FieldDescriptor::synthetic(SERIES_FIELD, VegaType::Categorical);
        if x.is_none() {
            // Series become the x categories themselves
            x = Some(discriminator);
            color = None;
        } else {
            offset = Some(discriminator);
        }
    }

    FieldRoles {
        x,
        y,
        color,
        series,
        offset,
        mark,
    }
}

/// Build the initial dialect document for a query result
pub fn synthesize(columns: &[QueryColumn], metadata: &QueryMetadata) -> Value {
    let roles = assign_roles(columns);

    let mut doc = Map::new();
    doc.insert("$schema".to_string(), json!(VEGA_LITE_SCHEMA));
    if !metadata.name.is_empty() {
        doc.insert("title".to_string(), json!(metadata.name));
    }

    let data = match &metadata.data_url {
        Some(url) => json!({"url": url, "format": {"type": "csv"}}),
        None => json!({"name": QUERY_RESULTS_DATASET}),
    };
    doc.insert("data".to_string(), data);

    if !roles.series.is_empty() {
        doc.insert(
            "transform".to_string(),
            json!([{"fold": roles.series, "as": [SERIES_FIELD, VALUE_FIELD]}]),
        );
    }

    doc.insert(
        "mark".to_string(),
        json!({"type": roles.mark.as_str(), "tooltip": true}),
    );

    let mut encoding = Map::new();
    if let Some(x) = &roles.x {
        encoding.insert("x".to_string(), x.encoding());
    }
    match &roles.y {
        Some(y) => {
            encoding.insert("y".to_string(), y.encoding());
        }
        None => {
            encoding.insert(
                "y".to_string(),
                json!({"aggregate": "count", "type": "quantitative", "title": "Count"}),
            );
        }
    }
    if let Some(color) = &roles.color {
        encoding.insert("color".to_string(), color.encoding());
    }
    if let Some(offset) = &roles.offset {
        encoding.insert(
            "xOffset".to_string(),
            json!({"field": offset.name, "type": offset.vega_type.encoding_type()}),
        );
    }
    doc.insert("encoding".to_string(), Value::Object(encoding));

    Value::Object(doc)
}
