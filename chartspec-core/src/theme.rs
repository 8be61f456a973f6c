//! Named config trees that can be merged into a spec's `config` key.
//!
//! The registry is populated once on first use and never mutated afterwards.
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum Theme {
    /// No theme merge; the spec's own config is used as written
    #[default]
    Custom,
    Dark,
    Excel,
    FiveThirtyEight,
    Ggplot2,
    GoogleCharts,
    LaTimes,
    Quartz,
    UrbanInstitute,
    Vox,
}

impl Theme {
    pub const ALL: [Theme; 10] = [
        Theme::Custom,
        Theme::Dark,
        Theme::Excel,
        Theme::FiveThirtyEight,
        Theme::Ggplot2,
        Theme::GoogleCharts,
        Theme::LaTimes,
        Theme::Quartz,
        Theme::UrbanInstitute,
        Theme::Vox,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Custom => "custom",
            Theme::Dark => "dark",
            Theme::Excel => "excel",
            Theme::FiveThirtyEight => "fivethirtyeight",
            Theme::Ggplot2 => "ggplot2",
            Theme::GoogleCharts => "googlecharts",
            Theme::LaTimes => "latimes",
            Theme::Quartz => "quartz",
            Theme::UrbanInstitute => "urbaninstitute",
            Theme::Vox => "vox",
        }
    }

    pub fn from_name(name: &str) -> Option<Theme> {
        Theme::ALL.into_iter().find(|theme| theme.as_str() == name)
    }
}

impl From<String> for Theme {
    fn from(value: String) -> Self {
        Theme::from_name(&value).unwrap_or_else(|| {
            log::warn!("Unknown theme {value:?}, falling back to custom");
            Theme::Custom
        })
    }
}

impl<'de> Deserialize<'de> for Theme {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(name) => Theme::from(name),
            other => {
                log::warn!("Theme {other} is not a name, falling back to custom");
                Theme::Custom
            }
        })
    }
}

impl From<Theme> for String {
    fn from(value: Theme) -> Self {
        value.as_str().to_string()
    }
}

impl Display for Theme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

lazy_static! {
    static ref THEME_CONFIGS: HashMap<Theme, Value> = build_theme_configs();
}

/// Look up the partial config tree for a theme. `Custom` has none.
pub fn theme_config(theme: Theme) -> Option<&'static Value> {
    THEME_CONFIGS.get(&theme)
}

/// Merge the theme's config into `spec["config"]`. Values declared by the spec win.
pub fn apply_theme(spec: &mut Value, theme: Theme) {
    let Some(theme_config) = theme_config(theme) else {
        return;
    };
    let Value::Object(spec_obj) = spec else {
        return;
    };
    let merged = match spec_obj.get("config") {
        Some(doc_config) => merge_config(theme_config, doc_config),
        None => theme_config.clone(),
    };
    spec_obj.insert("config".to_string(), merged);
}

/// Deep merge of two config trees, with `overrides` taking precedence on every conflict
pub fn merge_config(base: &Value, overrides: &Value) -> Value {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            let mut merged: Map<String, Value> = base.clone();
            for (key, value) in overrides {
                let entry = match merged.get(key) {
                    Some(base_value) => merge_config(base_value, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), entry);
            }
            Value::Object(merged)
        }
        (_, overrides) => overrides.clone(),
    }
}

fn mark_color_config(color: &str) -> Value {
    json!({
        "arc": {"fill": color},
        "area": {"fill": color},
        "line": {"stroke": color},
        "path": {"stroke": color},
        "rect": {"fill": color},
        "shape": {"stroke": color},
        "symbol": {"fill": color},
    })
}

fn build_theme_configs() -> HashMap<Theme, Value> {
    let mut configs = HashMap::new();

    configs.insert(
        Theme::Dark,
        json!({
            "background": "#333",
            "view": {"stroke": "#888"},
            "title": {"color": "#fff", "subtitleColor": "#fff"},
            "style": {"guide-label": {"fill": "#fff"}, "guide-title": {"fill": "#fff"}},
            "axis": {"domainColor": "#fff", "gridColor": "#888", "tickColor": "#fff"}
        }),
    );

    configs.insert(
        Theme::Excel,
        merge_config(
            &mark_color_config("#4572a7"),
            &json!({
                "line": {"strokeWidth": 2},
                "symbol": {"strokeWidth": 1.5, "size": 50},
                "axis": {
                    "bandPosition": 0.5,
                    "grid": true,
                    "gridColor": "#000000",
                    "gridOpacity": 0.15,
                    "gridWidth": 0.5,
                    "labelPadding": 10,
                    "tickSize": 5,
                    "tickWidth": 0.5
                },
                "axisBand": {"grid": false, "tickExtra": true},
                "legend": {
                    "labelBaseline": "middle",
                    "labelFontSize": 11,
                    "symbolSize": 50,
                    "symbolType": "square"
                },
                "range": {
                    "category": [
                        "#4572a7", "#aa4643", "#8aa453", "#71598e", "#4598ae",
                        "#d98445", "#94aace", "#d09393", "#b9cc98", "#a99cbc"
                    ]
                }
            }),
        ),
    );

    configs.insert(
        Theme::FiveThirtyEight,
        merge_config(
            &mark_color_config("#30a2da"),
            &json!({
                "background": "#f0f0f0",
                "group": {"fill": "#f0f0f0"},
                "line": {"strokeWidth": 2},
                "path": {"strokeWidth": 0.5},
                "point": {"filled": true, "shape": "circle"},
                "bar": {"binSpacing": 2, "fill": "#30a2da", "stroke": null},
                "axis": {
                    "domainColor": "#cbcbcb",
                    "grid": true,
                    "gridColor": "#cbcbcb",
                    "gridWidth": 1,
                    "labelColor": "#999",
                    "labelFontSize": 10,
                    "labelPadding": 4,
                    "tickColor": "#cbcbcb",
                    "tickSize": 10,
                    "titleColor": "#333",
                    "titleFontSize": 14,
                    "titlePadding": 10
                },
                "axisBand": {"grid": false},
                "legend": {
                    "labelColor": "#333",
                    "labelFontSize": 11,
                    "padding": 1,
                    "symbolSize": 30,
                    "symbolType": "square",
                    "titleColor": "#333",
                    "titleFontSize": 14,
                    "titlePadding": 10
                },
                "title": {"anchor": "start", "fontSize": 24, "fontWeight": 600, "offset": 20},
                "range": {
                    "category": [
                        "#30a2da", "#fc4f30", "#e5ae38", "#6d904f", "#8b8b8b", "#b96db8",
                        "#ff9e27", "#56cc60", "#52d2ca", "#52689e", "#545454", "#9fe4f8"
                    ],
                    "diverging": ["#cc0020", "#e77866", "#f6e7e1", "#d6e8ed", "#91bfd9", "#1d78b5"],
                    "heatmap": ["#d6e8ed", "#cee0e5", "#91bfd9", "#549cc6", "#1d78b5"]
                }
            }),
        ),
    );

    configs.insert(
        Theme::Ggplot2,
        merge_config(
            &mark_color_config("#000"),
            &json!({
                "background": "#fff",
                "group": {"fill": "#e5e5e5"},
                "symbol": {"size": 40},
                "axis": {
                    "domain": false,
                    "grid": true,
                    "gridColor": "#FFFFFF",
                    "gridOpacity": 1,
                    "labelColor": "#7F7F7F",
                    "labelPadding": 4,
                    "tickColor": "#7F7F7F",
                    "tickSize": 5.67,
                    "titleFontSize": 16,
                    "titleFontWeight": "normal"
                },
                "legend": {"labelBaseline": "middle", "labelFontSize": 11, "symbolSize": 40},
                "range": {
                    "category": [
                        "#000000", "#7F7F7F", "#1A1A1A", "#999999", "#333333",
                        "#B0B0B0", "#4D4D4D", "#C9C9C9", "#666666", "#DCDCDC"
                    ]
                }
            }),
        ),
    );

    configs.insert(
        Theme::GoogleCharts,
        merge_config(
            &mark_color_config("#3366CC"),
            &json!({
                "background": "white",
                "padding": {"top": 10, "right": 10, "bottom": 10, "left": 10},
                "style": {"guide-label": {"font": "Arial, sans-serif", "fontSize": 12}},
                "title": {"font": "Arial, sans-serif", "fontSize": 14},
                "axis": {"domain": false, "grid": true, "gridColor": "#ccc", "tickColor": "#ccc"},
                "range": {
                    "category": [
                        "#4285F4", "#DB4437", "#F4B400", "#0F9D58", "#AB47BC", "#00ACC1",
                        "#FF7043", "#9E9D24", "#5C6BC0", "#F06292", "#00796B", "#C2185B"
                    ]
                }
            }),
        ),
    );

    configs.insert(
        Theme::LaTimes,
        merge_config(
            &mark_color_config("#82c6df"),
            &json!({
                "background": "#ffffff",
                "title": {
                    "anchor": "start",
                    "color": "#000000",
                    "font": "Benton Gothic Bold, sans-serif",
                    "fontSize": 22,
                    "fontWeight": "normal"
                },
                "line": {"strokeWidth": 2},
                "symbol": {"size": 30},
                "axis": {
                    "labelFont": "Benton Gothic, sans-serif",
                    "labelFontSize": 11.5,
                    "labelFontWeight": "normal",
                    "titleFont": "Benton Gothic Bold, sans-serif",
                    "titleFontSize": 13,
                    "titleFontWeight": "normal"
                },
                "axisX": {"labelAngle": 0, "labelPadding": 4, "tickSize": 3},
                "axisY": {
                    "labelBaseline": "middle",
                    "maxExtent": 45,
                    "minExtent": 45,
                    "tickSize": 2,
                    "titleAlign": "left",
                    "titleAngle": 0,
                    "titleX": -45,
                    "titleY": -11
                },
                "legend": {
                    "labelFont": "Benton Gothic, sans-serif",
                    "labelFontSize": 11.5,
                    "symbolType": "square",
                    "titleFont": "Benton Gothic Bold, sans-serif",
                    "titleFontSize": 13,
                    "titleFontWeight": "normal"
                },
                "range": {
                    "category": ["#ec8431", "#829eb1", "#c89d29", "#3580b1", "#adc839", "#ab7fb4"]
                }
            }),
        ),
    );

    configs.insert(
        Theme::Quartz,
        merge_config(
            &mark_color_config("#ab5787"),
            &json!({
                "background": "#f9f9f9",
                "symbol": {"size": 30},
                "axis": {
                    "domainColor": "#979797",
                    "domainWidth": 0.5,
                    "gridWidth": 0.2,
                    "labelColor": "#979797",
                    "tickColor": "#979797",
                    "tickWidth": 0.2,
                    "titleColor": "#979797"
                },
                "axisBand": {"grid": false},
                "axisX": {"grid": true, "tickSize": 10},
                "axisY": {"domain": false, "grid": true, "tickSize": 0},
                "legend": {"labelFontSize": 11, "padding": 1, "symbolSize": 30, "symbolType": "square"},
                "range": {
                    "category": [
                        "#ab5787", "#51b2e5", "#703c5c", "#168dd9", "#d190b6",
                        "#00609f", "#d365ba", "#154866", "#666666", "#c4c4c4"
                    ]
                }
            }),
        ),
    );

    configs.insert(
        Theme::UrbanInstitute,
        merge_config(
            &mark_color_config("#1696d2"),
            &json!({
                "background": "#FFFFFF",
                "view": {"stroke": "transparent"},
                "title": {"anchor": "start", "fontSize": 18, "font": "Lato"},
                "line": {"strokeWidth": 5},
                "point": {"filled": true},
                "symbol": {"size": 30},
                "text": {"font": "Lato", "fontSize": 11, "align": "center", "fontWeight": 400},
                "axisX": {
                    "domain": true,
                    "domainColor": "#000000",
                    "domainWidth": 1,
                    "grid": false,
                    "labelAngle": 0,
                    "labelFont": "Lato",
                    "labelFontSize": 12,
                    "tickColor": "#000000",
                    "tickSize": 5,
                    "titleFont": "Lato",
                    "titleFontSize": 12,
                    "titlePadding": 10
                },
                "axisY": {
                    "domain": false,
                    "grid": true,
                    "gridColor": "#DEDDDD",
                    "gridWidth": 1,
                    "labelFont": "Lato",
                    "labelFontSize": 12,
                    "labelPadding": 8,
                    "ticks": false,
                    "titleAngle": 0,
                    "titleFont": "Lato",
                    "titleFontSize": 12,
                    "titlePadding": 10,
                    "titleX": 18,
                    "titleY": -10
                },
                "legend": {
                    "labelFont": "Lato",
                    "labelFontSize": 12,
                    "offset": 10,
                    "orient": "right",
                    "symbolSize": 100,
                    "titleFont": "Lato",
                    "titleFontSize": 12,
                    "titlePadding": 10
                },
                "range": {
                    "category": ["#1696d2", "#ec008b", "#fdbf11", "#000000", "#d2d2d2", "#55b748"]
                }
            }),
        ),
    );

    configs.insert(
        Theme::Vox,
        merge_config(
            &mark_color_config("#3e5c69"),
            &json!({
                "background": "#fff",
                "axis": {
                    "domainWidth": 0.5,
                    "grid": true,
                    "labelPadding": 2,
                    "tickSize": 5,
                    "tickWidth": 0.5,
                    "titleFontWeight": "normal"
                },
                "axisBand": {"grid": false},
                "axisX": {"gridWidth": 0.2},
                "axisY": {"gridDash": [3], "gridWidth": 0.4},
                "legend": {"labelFontSize": 11, "padding": 1, "symbolType": "square"},
                "range": {
                    "category": [
                        "#3e5c69", "#6793a6", "#182429", "#0570b0",
                        "#3690c0", "#74a9cf", "#a6bddb", "#e2ddf2"
                    ]
                }
            }),
        ),
    );

    configs
}
