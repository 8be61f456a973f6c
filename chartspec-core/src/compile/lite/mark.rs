use crate::compile::lite::encoding::{Channel, Orient, ResolvedChannel, ResolvedEncoding, StackInfo};
use crate::compile::lite::spec::FieldType;
use chartspec_common::error::{ChartSpecError, Result};
use chartspec_common::escape::{datum_accessor, unescape_field};
use itertools::Itertools;
use serde_json::{json, Map, Value};

pub const DEFAULT_COLOR: &str = "#4c78a8";

/// Mark properties copied onto the encode block as constant values
const PASSTHROUGH_PROPS: &[&str] = &[
    "strokeWidth",
    "strokeDash",
    "strokeOpacity",
    "fillOpacity",
    "cornerRadius",
    "angle",
    "align",
    "baseline",
    "dx",
    "dy",
    "font",
    "fontSize",
    "fontWeight",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkType {
    Bar,
    Line,
    Area,
    Point,
    Circle,
    Square,
    Tick,
    Rule,
    Rect,
    Text,
}

impl MarkType {
    pub fn parse(name: &str) -> Result<Self> {
        Ok(match name {
            "bar" => MarkType::Bar,
            "line" => MarkType::Line,
            "area" => MarkType::Area,
            "point" => MarkType::Point,
            "circle" => MarkType::Circle,
            "square" => MarkType::Square,
            "tick" => MarkType::Tick,
            "rule" => MarkType::Rule,
            "rect" => MarkType::Rect,
            "text" => MarkType::Text,
            other => {
                return Err(ChartSpecError::compilation(format!(
                    "Unsupported mark type {other:?}"
                )))
            }
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            MarkType::Bar => "bar",
            MarkType::Line => "line",
            MarkType::Area => "area",
            MarkType::Point => "point",
            MarkType::Circle => "circle",
            MarkType::Square => "square",
            MarkType::Tick => "tick",
            MarkType::Rule => "rule",
            MarkType::Rect => "rect",
            MarkType::Text => "text",
        }
    }

    fn vega_type(&self) -> &'static str {
        match self {
            MarkType::Bar | MarkType::Tick | MarkType::Rect => "rect",
            MarkType::Line => "line",
            MarkType::Area => "area",
            MarkType::Point | MarkType::Circle | MarkType::Square => "symbol",
            MarkType::Rule => "rule",
            MarkType::Text => "text",
        }
    }

    /// Whether discrete positional channels use band scales
    pub fn is_banded(&self) -> bool {
        matches!(self, MarkType::Bar | MarkType::Tick | MarkType::Rect)
    }

    pub fn default_filled(&self) -> bool {
        !matches!(self, MarkType::Point | MarkType::Line | MarkType::Rule)
    }

    /// Whether the color channel drives `stroke` rather than `fill`
    pub fn is_stroked(&self, filled: bool) -> bool {
        match self {
            MarkType::Line | MarkType::Rule => true,
            MarkType::Point | MarkType::Circle | MarkType::Square => !filled,
            _ => false,
        }
    }

    fn is_symbol(&self) -> bool {
        matches!(self, MarkType::Point | MarkType::Circle | MarkType::Square)
    }
}

pub fn is_filled(mark: MarkType, props: &Map<String, Value>) -> bool {
    props
        .get("filled")
        .and_then(Value::as_bool)
        .unwrap_or_else(|| mark.default_filled())
}

pub fn build_marks(
    mark: MarkType,
    props: &Map<String, Value>,
    encoding: &ResolvedEncoding,
    stack: Option<&StackInfo>,
    data: &str,
) -> Vec<Value> {
    let filled = is_filled(mark, props);
    let update = encode_update(mark, filled, props, encoding, stack);

    let mut main = Map::new();
    main.insert("name".to_string(), json!("marks"));
    main.insert("type".to_string(), json!(mark.vega_type()));
    main.insert("style".to_string(), json!([mark.name()]));

    let series_field = encoding
        .get(Channel::Color)
        .and_then(|c| c.field.clone())
        .filter(|_| matches!(mark, MarkType::Line | MarkType::Area));

    if matches!(mark, MarkType::Line | MarkType::Area) {
        let sort_channel = match encoding.orient() {
            Orient::Vertical => Channel::X,
            Orient::Horizontal => Channel::Y,
        };
        if let Some(field) = encoding.get(sort_channel).and_then(|c| c.field.as_ref()) {
            main.insert("sort".to_string(), json!({"field": datum_accessor(field)}));
        }
    }
    main.insert("encode".to_string(), json!({"update": update}));

    match series_field {
        Some(series_field) => {
            // One path per series
            let facet_name = "faceted_path_main";
            main.insert("from".to_string(), json!({"data": facet_name}));
            vec![json!({
                "name": "pathgroup",
                "type": "group",
                "from": {
                    "facet": {"name": facet_name, "data": data, "groupby": [series_field]}
                },
                "encode": {
                    "update": {
                        "width": {"field": {"group": "width"}},
                        "height": {"field": {"group": "height"}}
                    }
                },
                "marks": [Value::Object(main)]
            })]
        }
        None => {
            main.insert("from".to_string(), json!({"data": data}));
            vec![Value::Object(main)]
        }
    }
}

fn encode_update(
    mark: MarkType,
    filled: bool,
    props: &Map<String, Value>,
    encoding: &ResolvedEncoding,
    stack: Option<&StackInfo>,
) -> Map<String, Value> {
    let mut update = Map::new();
    let orient = encoding.orient();

    match mark {
        MarkType::Bar => {
            let measure = match orient {
                Orient::Vertical => Channel::Y,
                Orient::Horizontal => Channel::X,
            };
            for axis in [Channel::X, Channel::Y] {
                rect_axis(&mut update, axis, encoding, axis == measure, stack, 5.0);
            }
        }
        MarkType::Rect => {
            for axis in [Channel::X, Channel::Y] {
                rect_axis(&mut update, axis, encoding, false, stack, 5.0);
            }
        }
        MarkType::Tick => {
            for axis in [Channel::X, Channel::Y] {
                rect_axis(&mut update, axis, encoding, false, stack, 1.0);
            }
        }
        MarkType::Area => {
            let (measure, other) = match orient {
                Orient::Vertical => (Channel::Y, Channel::X),
                Orient::Horizontal => (Channel::X, Channel::Y),
            };
            point_axis(&mut update, other, encoding);
            measure_axis(&mut update, measure, encoding, stack);
            if orient == Orient::Horizontal {
                update.insert("orient".to_string(), json!({"value": "horizontal"}));
            }
        }
        MarkType::Rule => {
            let x = encoding.get(Channel::X);
            let y = encoding.get(Channel::Y);
            match (x, y) {
                (Some(_), None) => {
                    point_axis(&mut update, Channel::X, encoding);
                    update.insert("y".to_string(), json!({"value": 0}));
                    update.insert("y2".to_string(), json!({"signal": "height"}));
                }
                (None, Some(_)) => {
                    point_axis(&mut update, Channel::Y, encoding);
                    update.insert("x".to_string(), json!({"value": 0}));
                    update.insert("x2".to_string(), json!({"signal": "width"}));
                }
                _ => {
                    point_axis(&mut update, Channel::X, encoding);
                    measure_axis(&mut update, Channel::Y, encoding, None);
                }
            }
        }
        MarkType::Line
        | MarkType::Point
        | MarkType::Circle
        | MarkType::Square
        | MarkType::Text => {
            point_axis(&mut update, Channel::X, encoding);
            point_axis(&mut update, Channel::Y, encoding);
        }
    }

    // Color
    let color_prop = if mark.is_stroked(filled) {
        "stroke"
    } else {
        "fill"
    };
    let color = match encoding.get(Channel::Color) {
        Some(color) if color.field.is_some() => color.value_ref(Some("color")),
        Some(color) => color.value_ref(None),
        None => json!({"value": props.get("color").cloned().unwrap_or(json!(DEFAULT_COLOR))}),
    };
    update.insert(color_prop.to_string(), color);
    if mark == MarkType::Point && !filled && !props.contains_key("strokeWidth") {
        update.insert("strokeWidth".to_string(), json!({"value": 2}));
    }

    // Opacity
    match encoding.get(Channel::Opacity) {
        Some(opacity) => {
            update.insert(
                "opacity".to_string(),
                channel_ref(opacity, Channel::Opacity.name()),
            );
        }
        None => {
            if let Some(opacity) = props.get("opacity") {
                update.insert("opacity".to_string(), json!({"value": opacity}));
            }
        }
    }

    // Size
    if let Some(size) = encoding.get(Channel::Size) {
        let size_prop = match mark {
            _ if mark.is_symbol() => Some("size"),
            MarkType::Text => Some("fontSize"),
            _ => None,
        };
        match size_prop {
            Some(prop) => {
                update.insert(prop.to_string(), channel_ref(size, Channel::Size.name()));
            }
            None => log::warn!("Size channel is ignored for {} marks", mark.name()),
        }
    }

    // Shape
    match mark {
        MarkType::Circle => {
            update.insert("shape".to_string(), json!({"value": "circle"}));
        }
        MarkType::Square => {
            update.insert("shape".to_string(), json!({"value": "square"}));
        }
        MarkType::Point => {
            if let Some(shape) = encoding.get(Channel::Shape) {
                update.insert("shape".to_string(), channel_ref(shape, Channel::Shape.name()));
            }
        }
        _ => {}
    }

    // Text
    if mark == MarkType::Text {
        if let Some(text) = encoding.get(Channel::Text) {
            let text_ref = match &text.field {
                Some(field) if text.type_ == FieldType::Temporal => {
                    json!({"signal": temporal_label(field)})
                }
                _ => text.value_ref(None),
            };
            update.insert("text".to_string(), text_ref);
        }
        update
            .entry("align".to_string())
            .or_insert(json!({"value": "center"}));
        update
            .entry("baseline".to_string())
            .or_insert(json!({"value": "middle"}));
    }

    if let Some(tooltip) = tooltip_signal(props, encoding) {
        update.insert("tooltip".to_string(), json!({"signal": tooltip}));
    }

    if matches!(mark, MarkType::Line | MarkType::Area) {
        if let Some(interpolate) = props.get("interpolate") {
            update.insert("interpolate".to_string(), json!({"value": interpolate}));
        }
    }
    for prop in PASSTHROUGH_PROPS {
        if let Some(value) = props.get(*prop) {
            update
                .entry(prop.to_string())
                .or_insert(json!({"value": value}));
        }
    }

    update
}

fn channel_ref(channel: &ResolvedChannel, scale: &str) -> Value {
    if channel.field.is_some() {
        channel.value_ref(Some(scale))
    } else {
        channel.value_ref(None)
    }
}

fn axis_names(axis: Channel) -> (&'static str, &'static str, &'static str, &'static str) {
    match axis {
        Channel::X => ("x", "x2", "xc", "width"),
        _ => ("y", "y2", "yc", "height"),
    }
}

/// Position along one axis for marks with an extent (rect-like marks)
fn rect_axis(
    update: &mut Map<String, Value>,
    axis: Channel,
    encoding: &ResolvedEncoding,
    is_measure: bool,
    stack: Option<&StackInfo>,
    thickness: f64,
) {
    let (start, _, center, extent) = axis_names(axis);
    let scale = axis.name();
    let Some(channel) = encoding.get(axis) else {
        update.insert(start.to_string(), json!({"value": 0}));
        update.insert(extent.to_string(), json!({"signal": extent}));
        return;
    };
    let Some(field) = &channel.field else {
        update.insert(center.to_string(), channel.value_ref(None));
        update.insert(extent.to_string(), json!({"value": thickness}));
        return;
    };

    if channel.is_discrete() {
        let offset = encoding
            .get(Channel::XOffset)
            .and_then(|c| c.field.clone())
            .filter(|_| axis == Channel::X);
        match offset {
            Some(offset_field) => {
                update.insert(
                    start.to_string(),
                    json!({
                        "scale": scale,
                        "field": field,
                        "offset": {"scale": Channel::XOffset.name(), "field": offset_field}
                    }),
                );
                update.insert(
                    extent.to_string(),
                    json!({"scale": Channel::XOffset.name(), "band": 1}),
                );
            }
            None => {
                update.insert(start.to_string(), json!({"scale": scale, "field": field}));
                update.insert(extent.to_string(), json!({"scale": scale, "band": 1}));
            }
        }
    } else if is_measure {
        measure_axis(update, axis, encoding, stack);
    } else {
        update.insert(center.to_string(), json!({"scale": scale, "field": field}));
        update.insert(extent.to_string(), json!({"value": thickness}));
    }
}

/// Position of a measure running from the baseline (or stack start) to its value
fn measure_axis(
    update: &mut Map<String, Value>,
    axis: Channel,
    encoding: &ResolvedEncoding,
    stack: Option<&StackInfo>,
) {
    let (start, end, _, extent) = axis_names(axis);
    let scale = axis.name();
    match (stack, encoding.get(axis)) {
        (Some(stack), Some(_)) if stack.measure == axis => {
            update.insert(start.to_string(), json!({"scale": scale, "field": stack.end}));
            update.insert(end.to_string(), json!({"scale": scale, "field": stack.start}));
        }
        (_, Some(channel)) if channel.field.is_some() => {
            update.insert(start.to_string(), channel.value_ref(Some(scale)));
            update.insert(end.to_string(), json!({"scale": scale, "value": 0}));
        }
        (_, Some(channel)) => {
            update.insert(start.to_string(), channel.value_ref(None));
            update.insert(end.to_string(), json!({"value": 0}));
        }
        (_, None) => {
            update.insert(start.to_string(), json!({"value": 0}));
            update.insert(end.to_string(), json!({"signal": extent}));
        }
    }
}

/// Position of a single point along one axis
fn point_axis(update: &mut Map<String, Value>, axis: Channel, encoding: &ResolvedEncoding) {
    let (start, _, _, extent) = axis_names(axis);
    let value = match encoding.get(axis) {
        Some(channel) if channel.field.is_some() => channel.value_ref(Some(axis.name())),
        Some(channel) => channel.value_ref(None),
        None => json!({"signal": format!("{extent} / 2")}),
    };
    update.insert(start.to_string(), value);
}

fn temporal_label(field: &str) -> String {
    format!("timeFormat({}, '%b %d, %Y')", datum_accessor(field))
}

/// Tooltip expression building an object of the encoded fields
fn tooltip_signal(props: &Map<String, Value>, encoding: &ResolvedEncoding) -> Option<String> {
    let channels: Vec<&ResolvedChannel> = if encoding.tooltip_declared {
        encoding.tooltip.iter().collect()
    } else if props.get("tooltip") == Some(&Value::Bool(true)) {
        encoding
            .field_channels()
            .filter(|c| c.channel != Channel::XOffset)
            .collect()
    } else {
        return None;
    };

    let entries = channels
        .into_iter()
        .filter_map(|channel| {
            let field = channel.field.as_ref()?;
            let title = match channel.title() {
                Value::String(title) => title,
                _ => unescape_field(field),
            };
            let accessor = if channel.type_ == FieldType::Temporal {
                temporal_label(field)
            } else {
                datum_accessor(field)
            };
            Some((title, accessor))
        })
        .unique_by(|(title, _)| title.clone())
        .map(|(title, accessor)| format!("{}: {}", Value::String(title), accessor))
        .collect::<Vec<_>>();

    if entries.is_empty() {
        None
    } else {
        Some(format!("{{{}}}", entries.join(", ")))
    }
}
