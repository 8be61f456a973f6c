//! Container-driven sizing of the rendered chart.
//!
//! The flow is measurement of the fixed-size parent, then [`derive_parent_size`] (padding and
//! editor clamp), the noise gate in [`exceeds_noise`], and finally [`render_size`] which turns the
//! stored [`ParentSize`] into the pixel size handed to the renderer.
pub mod debounce;
pub mod engine;
pub mod sizing;

pub use debounce::Debouncer;
pub use engine::LayoutEngine;
pub use sizing::{find_sizing_parent, LayoutNode, SizingParent};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Where the chart is being rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutContext {
    /// Dashboard widget
    #[default]
    Widget,
    /// Preview pane of the visualization editor
    Editor,
    /// Query page result area
    Query,
}

impl LayoutContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutContext::Widget => "widget",
            LayoutContext::Editor => "editor",
            LayoutContext::Query => "query",
        }
    }
}

impl Display for LayoutContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Quiet period in milliseconds before a container resize is applied
    #[serde(default = "default_debounce_wait_ms")]
    pub debounce_wait_ms: u64,

    /// Measurements closer than this many pixels on both axes are treated as jitter
    #[serde(default = "default_noise_threshold")]
    pub noise_threshold: f64,

    #[serde(default = "default_editor_max_width")]
    pub editor_max_width: f64,

    #[serde(default = "default_editor_max_height")]
    pub editor_max_height: f64,

    /// Height cap as a fraction of width in the editor
    #[serde(default = "default_editor_aspect_ratio")]
    pub editor_aspect_ratio: f64,

    #[serde(default = "default_widget_horizontal_padding")]
    pub widget_horizontal_padding: f64,

    #[serde(default = "default_editor_vertical_padding")]
    pub editor_vertical_padding: f64,
}

fn default_debounce_wait_ms() -> u64 {
    300
}

fn default_noise_threshold() -> f64 {
    10.0
}

fn default_editor_max_width() -> f64 {
    800.0
}

fn default_editor_max_height() -> f64 {
    600.0
}

fn default_editor_aspect_ratio() -> f64 {
    0.67
}

fn default_widget_horizontal_padding() -> f64 {
    30.0
}

fn default_editor_vertical_padding() -> f64 {
    20.0
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            debounce_wait_ms: default_debounce_wait_ms(),
            noise_threshold: default_noise_threshold(),
            editor_max_width: default_editor_max_width(),
            editor_max_height: default_editor_max_height(),
            editor_aspect_ratio: default_editor_aspect_ratio(),
            widget_horizontal_padding: default_widget_horizontal_padding(),
            editor_vertical_padding: default_editor_vertical_padding(),
        }
    }
}

impl LayoutConfig {
    pub fn debounce_wait(&self) -> Duration {
        Duration::from_millis(self.debounce_wait_ms)
    }
}

/// Padding of a measured box, in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxPadding {
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub right: f64,
    #[serde(default)]
    pub bottom: f64,
    #[serde(default)]
    pub left: f64,
}

impl BoxPadding {
    pub fn uniform(padding: f64) -> Self {
        Self {
            top: padding,
            right: padding,
            bottom: padding,
            left: padding,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Observed box of the fixed-size parent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub padding: BoxPadding,
}

impl Measurement {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            padding: BoxPadding::default(),
        }
    }

    pub fn with_padding(mut self, padding: BoxPadding) -> Self {
        self.padding = padding;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Space available to the chart inside its container
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParentSize {
    pub width: f64,
    pub height: f64,
}

impl ParentSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Pixel size handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderSize {
    /// Both dimensions follow the container
    pub autoresize: bool,
    pub width: f64,
    pub height: f64,
}

/// Content box of the measurement, clamped in the editor to keep a usable aspect ratio
pub fn derive_parent_size(
    measurement: &Measurement,
    context: LayoutContext,
    config: &LayoutConfig,
) -> ParentSize {
    let mut width = (measurement.width - measurement.padding.horizontal()).max(0.0);
    let mut height = (measurement.height - measurement.padding.vertical()).max(0.0);
    if context == LayoutContext::Editor {
        width = width.min(config.editor_max_width);
        height = height
            .min(config.editor_max_height)
            .min(config.editor_aspect_ratio * width);
    }
    ParentSize::new(width, height)
}

/// Whether `next` should replace `previous`
pub fn exceeds_noise(previous: Option<&ParentSize>, next: &ParentSize, threshold: f64) -> bool {
    match previous {
        None => true,
        Some(previous) => {
            (previous.width - next.width).abs() > threshold
                || (previous.height - next.height).abs() > threshold
        }
    }
}

/// Padding declared by a document, as a number or a per-side object
pub fn document_padding(spec: &Value) -> BoxPadding {
    match spec.get("padding") {
        Some(Value::Number(n)) => BoxPadding::uniform(n.as_f64().unwrap_or(0.0)),
        Some(Value::Object(sides)) => {
            let side = |name: &str| sides.get(name).and_then(Value::as_f64).unwrap_or(0.0);
            BoxPadding {
                top: side("top"),
                right: side("right"),
                bottom: side("bottom"),
                left: side("left"),
            }
        }
        _ => BoxPadding::default(),
    }
}

/// Final renderer size. Sizes declared on the document are used verbatim.
pub fn render_size(
    spec: &Value,
    parent: &ParentSize,
    context: LayoutContext,
    config: &LayoutConfig,
) -> RenderSize {
    let declared_width = spec.get("width").and_then(Value::as_f64);
    let declared_height = spec.get("height").and_then(Value::as_f64);

    let padding = document_padding(spec);
    let mut width = parent.width - padding.horizontal();
    let mut height = parent.height - padding.vertical();
    match context {
        LayoutContext::Widget => width -= config.widget_horizontal_padding,
        LayoutContext::Editor => height -= config.editor_vertical_padding,
        LayoutContext::Query => {}
    }

    RenderSize {
        autoresize: declared_width.is_none() && declared_height.is_none(),
        width: declared_width.unwrap_or_else(|| width.floor().max(0.0)),
        height: declared_height.unwrap_or_else(|| height.floor().max(0.0)),
    }
}
