use crate::compile::lite::mark::MarkType;
use crate::compile::lite::spec::{ChannelDef, FieldType, LiteEncoding, TooltipDef};
use chartspec_common::error::{ChartSpecError, Result};
use chartspec_common::escape::{escape_field, unescape_field};
use itertools::Itertools;
use serde_json::{json, Map, Value};

pub const COUNT_FIELD: &str = "__count";

const AGGREGATE_OPS: &[&str] = &[
    "count", "valid", "missing", "distinct", "sum", "product", "mean", "average", "variance",
    "variancep", "stdev", "stdevp", "stderr", "median", "q1", "q3", "min", "max",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    X,
    Y,
    Color,
    Size,
    Opacity,
    Shape,
    Text,
    XOffset,
    Tooltip,
}

impl Channel {
    pub fn name(&self) -> &'static str {
        match self {
            Channel::X => "x",
            Channel::Y => "y",
            Channel::Color => "color",
            Channel::Size => "size",
            Channel::Opacity => "opacity",
            Channel::Shape => "shape",
            Channel::Text => "text",
            Channel::XOffset => "xOffset",
            Channel::Tooltip => "tooltip",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orient {
    Vertical,
    Horizontal,
}

/// Channel definition after type defaults and aggregation naming are applied
#[derive(Debug, Clone)]
pub struct ResolvedChannel {
    pub channel: Channel,
    /// Field read from the input data
    pub source_field: Option<String>,
    /// Field read by marks and scales, after aggregation
    pub field: Option<String>,
    pub type_: FieldType,
    pub aggregate: Option<String>,
    pub value: Option<Value>,
    pub def: ChannelDef,
}

impl ResolvedChannel {
    pub fn resolve(channel: Channel, def: &ChannelDef) -> Result<Self> {
        let aggregate = match &def.aggregate {
            Some(op) if !AGGREGATE_OPS.contains(&op.as_str()) => {
                return Err(ChartSpecError::compilation(format!(
                    "Unsupported aggregate op {op:?} on channel {}",
                    channel.name()
                )));
            }
            other => other.clone(),
        };
        let is_count = aggregate.as_deref() == Some("count");

        if def.field.is_none() && def.value.is_none() && !is_count {
            return Err(ChartSpecError::compilation(format!(
                "Channel {} needs a field or a value",
                channel.name()
            )));
        }

        let type_ = match (def.type_, &aggregate) {
            (Some(type_), _) => type_,
            (None, Some(_)) => FieldType::Quantitative,
            (None, None) => {
                if def.field.is_some() {
                    log::warn!(
                        "Channel {} has no type, defaulting to nominal",
                        channel.name()
                    );
                }
                FieldType::Nominal
            }
        };

        let field = match (&aggregate, &def.field) {
            (Some(op), _) if op == "count" => Some(COUNT_FIELD.to_string()),
            (Some(op), Some(field)) => Some(escape_field(&aggregate_as(op, field))),
            (Some(op), None) => {
                return Err(ChartSpecError::compilation(format!(
                    "Aggregate {op:?} on channel {} needs a field",
                    channel.name()
                )));
            }
            (None, field) => field.clone(),
        };

        Ok(Self {
            channel,
            source_field: def.field.clone(),
            field,
            type_,
            aggregate,
            value: def.value.clone(),
            def: def.clone(),
        })
    }

    pub fn is_discrete(&self) -> bool {
        self.type_.is_discrete()
    }

    pub fn title(&self) -> Value {
        if let Some(title) = &self.def.title {
            return title.clone();
        }
        match (&self.aggregate, &self.source_field) {
            (Some(op), _) if op == "count" => json!("Count of Records"),
            (Some(op), Some(field)) => json!(format!("{} of {}", op, unescape_field(field))),
            (_, Some(field)) => json!(unescape_field(field)),
            _ => Value::Null,
        }
    }

    /// `{"scale": .., "field": ..}` or `{"value": ..}` reference for an encode block
    pub fn value_ref(&self, scale: Option<&str>) -> Value {
        match (&self.field, &self.value) {
            (Some(field), _) => match scale {
                Some(scale) => json!({"scale": scale, "field": field}),
                None => json!({"field": field}),
            },
            (None, Some(value)) => json!({"value": value}),
            (None, None) => Value::Null,
        }
    }

    pub fn scale_visible(&self) -> bool {
        self.field.is_some()
    }
}

fn aggregate_as(op: &str, field: &str) -> String {
    format!("{}_{}", op, unescape_field(field))
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedEncoding {
    pub channels: Vec<ResolvedChannel>,
    pub tooltip: Vec<ResolvedChannel>,
    pub tooltip_declared: bool,
}

impl ResolvedEncoding {
    pub fn resolve(encoding: &LiteEncoding) -> Result<Self> {
        if !encoding.extra.is_empty() {
            return Err(ChartSpecError::compilation(format!(
                "Unsupported encoding channel(s): {}",
                encoding.extra.keys().join(", ")
            )));
        }

        let defs = [
            (Channel::X, &encoding.x),
            (Channel::Y, &encoding.y),
            (Channel::Color, &encoding.color),
            (Channel::Size, &encoding.size),
            (Channel::Opacity, &encoding.opacity),
            (Channel::Shape, &encoding.shape),
            (Channel::Text, &encoding.text),
            (Channel::XOffset, &encoding.x_offset),
        ];
        let mut channels = Vec::new();
        for (channel, def) in defs {
            if let Some(def) = def {
                channels.push(ResolvedChannel::resolve(channel, def)?);
            }
        }

        let tooltip_defs = match &encoding.tooltip {
            None => Vec::new(),
            Some(TooltipDef::Single(def)) => vec![def.clone()],
            Some(TooltipDef::Many(defs)) => defs.clone(),
        };
        let tooltip = tooltip_defs
            .iter()
            .map(|def| ResolvedChannel::resolve(Channel::Tooltip, def))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            channels,
            tooltip,
            tooltip_declared: encoding.tooltip.is_some(),
        })
    }

    pub fn get(&self, channel: Channel) -> Option<&ResolvedChannel> {
        self.channels.iter().find(|c| c.channel == channel)
    }

    pub fn field_channels(&self) -> impl Iterator<Item = &ResolvedChannel> {
        self.channels.iter().filter(|c| c.field.is_some())
    }

    pub fn orient(&self) -> Orient {
        let x_continuous = self.get(Channel::X).is_some_and(|x| !x.is_discrete());
        let y_discrete = self.get(Channel::Y).is_some_and(|y| y.is_discrete());
        if x_continuous && y_discrete {
            Orient::Horizontal
        } else {
            Orient::Vertical
        }
    }

    /// Input fields that should be parsed as dates before any other transform
    pub fn temporal_source_fields(&self) -> Vec<String> {
        self.channels
            .iter()
            .chain(self.tooltip.iter())
            .filter(|c| c.type_ == FieldType::Temporal && c.aggregate.is_none())
            .filter_map(|c| c.source_field.clone())
            .unique()
            .collect()
    }

    /// Aggregate transform lowering the channels' `aggregate` properties
    pub fn aggregate_transform(&self) -> Option<Value> {
        let aggregated = self
            .channels
            .iter()
            .chain(self.tooltip.iter())
            .filter(|c| c.aggregate.is_some())
            .unique_by(|c| c.field.clone())
            .collect::<Vec<_>>();
        if aggregated.is_empty() {
            return None;
        }

        let groupby = self
            .channels
            .iter()
            .chain(self.tooltip.iter())
            .filter(|c| c.aggregate.is_none())
            .filter_map(|c| c.source_field.clone())
            .unique()
            .collect::<Vec<_>>();

        let mut ops = Vec::new();
        let mut fields = Vec::new();
        let mut as_ = Vec::new();
        for channel in aggregated {
            let op = channel.aggregate.clone().unwrap_or_default();
            if op == "count" {
                fields.push(Value::Null);
                as_.push(json!(COUNT_FIELD));
            } else {
                fields.push(json!(channel.source_field));
                as_.push(json!(channel.field.as_deref().map(unescape_field)));
            }
            ops.push(json!(op));
        }

        Some(json!({
            "type": "aggregate",
            "groupby": groupby,
            "ops": ops,
            "fields": fields,
            "as": as_,
        }))
    }
}

/// Stacked measure fields produced by a stack transform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackInfo {
    pub measure: Channel,
    pub start: String,
    pub end: String,
}

/// Stack transform for bar and area marks split by a discrete color field
pub fn stack_transform(mark: MarkType, encoding: &ResolvedEncoding) -> Option<(Value, StackInfo)> {
    if !matches!(mark, MarkType::Bar | MarkType::Area) || encoding.get(Channel::XOffset).is_some()
    {
        return None;
    }
    let color_field = encoding
        .get(Channel::Color)
        .filter(|c| c.is_discrete())
        .and_then(|c| c.field.clone())?;

    let (measure, other) = match encoding.orient() {
        Orient::Vertical => (Channel::Y, Channel::X),
        Orient::Horizontal => (Channel::X, Channel::Y),
    };
    let measure_channel = encoding
        .get(measure)
        .filter(|c| c.type_ == FieldType::Quantitative)?;
    let measure_field = measure_channel.field.clone()?;

    let offset = match &measure_channel.def.stack {
        Some(None) => return None,
        Some(Some(Value::Bool(false))) | Some(Some(Value::Null)) => return None,
        Some(Some(Value::String(offset))) if offset == "normalize" || offset == "center" => {
            offset.clone()
        }
        _ => "zero".to_string(),
    };

    let groupby = encoding
        .get(other)
        .and_then(|c| c.field.clone())
        .into_iter()
        .collect::<Vec<_>>();

    let plain = unescape_field(&measure_field);
    let start = format!("{plain}_start");
    let end = format!("{plain}_end");
    let transform = json!({
        "type": "stack",
        "groupby": groupby,
        "field": measure_field,
        "sort": {"field": [color_field], "order": ["descending"]},
        "as": [start, end],
        "offset": offset,
    });
    Some((
        transform,
        StackInfo {
            measure,
            start: escape_field(&start),
            end: escape_field(&end),
        },
    ))
}

fn merge_props(mut base: Map<String, Value>, overrides: Option<&Map<String, Value>>) -> Value {
    if let Some(overrides) = overrides {
        for (k, v) in overrides {
            base.insert(k.clone(), v.clone());
        }
    }
    Value::Object(base)
}

fn as_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub fn build_scales(
    mark: MarkType,
    encoding: &ResolvedEncoding,
    stack: Option<&StackInfo>,
    data: &str,
) -> Vec<Value> {
    let mut scales = Vec::new();

    for channel in encoding.field_channels() {
        let Some(field) = &channel.field else {
            continue;
        };
        let domain = match stack {
            Some(stack) if stack.measure == channel.channel => {
                json!({"data": data, "fields": [stack.start, stack.end]})
            }
            _ if channel.is_discrete() => json!({"data": data, "field": field, "sort": true}),
            _ => json!({"data": data, "field": field}),
        };

        let scale = match channel.channel {
            Channel::X | Channel::Y => {
                let range = if channel.channel == Channel::X {
                    "width"
                } else {
                    "height"
                };
                match channel.type_ {
                    FieldType::Quantitative => json!({
                        "type": "linear", "domain": domain, "range": range,
                        "nice": true, "zero": true
                    }),
                    FieldType::Temporal => json!({
                        "type": "time", "domain": domain, "range": range
                    }),
                    FieldType::Nominal | FieldType::Ordinal => {
                        if mark.is_banded() {
                            json!({
                                "type": "band", "domain": domain, "range": range,
                                "paddingInner": 0.1, "paddingOuter": 0.05
                            })
                        } else {
                            json!({
                                "type": "point", "domain": domain, "range": range,
                                "padding": 0.5
                            })
                        }
                    }
                }
            }
            Channel::XOffset => json!({
                "type": "band", "domain": domain,
                "range": [0, {"signal": "bandwidth('x')"}],
                "paddingInner": 0.05
            }),
            Channel::Color => {
                if channel.is_discrete() {
                    json!({"type": "ordinal", "domain": domain, "range": "category"})
                } else {
                    json!({"type": "linear", "domain": domain, "range": "ramp", "zero": false})
                }
            }
            Channel::Size | Channel::Opacity => {
                let range = if channel.channel == Channel::Size {
                    json!([9, 361])
                } else {
                    json!([0.3, 0.8])
                };
                if channel.is_discrete() {
                    json!({"type": "point", "domain": domain, "range": range, "padding": 1})
                } else {
                    json!({"type": "linear", "domain": domain, "range": range, "zero": false})
                }
            }
            Channel::Shape => json!({"type": "ordinal", "domain": domain, "range": "symbol"}),
            Channel::Text | Channel::Tooltip => continue,
        };

        let mut scale = as_map(scale);
        scale.insert("name".to_string(), json!(channel.channel.name()));
        scales.push(merge_props(scale, channel.def.scale.as_ref()));
    }

    scales
}

pub fn build_axes(encoding: &ResolvedEncoding) -> Vec<Value> {
    let mut axes = Vec::new();
    for (channel, orient) in [(Channel::X, "bottom"), (Channel::Y, "left")] {
        let Some(resolved) = encoding.get(channel).filter(|c| c.scale_visible()) else {
            continue;
        };
        let overrides = match &resolved.def.axis {
            Some(None) => continue,
            Some(Some(overrides)) => Some(overrides),
            None => None,
        };
        let axis = json!({
            "scale": channel.name(),
            "orient": orient,
            "title": resolved.title(),
            "grid": resolved.type_ == FieldType::Quantitative,
            "labelOverlap": true,
        });
        axes.push(merge_props(as_map(axis), overrides));
    }
    axes
}

pub fn build_legends(mark: MarkType, filled: bool, encoding: &ResolvedEncoding) -> Vec<Value> {
    let mut legends = Vec::new();
    for channel in [
        Channel::Color,
        Channel::Size,
        Channel::Opacity,
        Channel::Shape,
    ] {
        let Some(resolved) = encoding.get(channel).filter(|c| c.scale_visible()) else {
            continue;
        };
        let overrides = match &resolved.def.legend {
            Some(None) => continue,
            Some(Some(overrides)) => Some(overrides),
            None => None,
        };
        let property = match channel {
            Channel::Color if mark.is_stroked(filled) => "stroke",
            Channel::Color => "fill",
            other => other.name(),
        };
        let mut legend = Map::new();
        legend.insert(property.to_string(), json!(channel.name()));
        legend.insert("title".to_string(), resolved.title());
        if channel == Channel::Color && mark == MarkType::Line {
            legend.insert("symbolType".to_string(), json!("stroke"));
        }
        legends.push(merge_props(legend, overrides));
    }
    legends
}
