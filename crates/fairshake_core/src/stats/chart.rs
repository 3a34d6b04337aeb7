//! Chart specifications (traces + layout) and embeddable markup rendering.
//!
//! The structures serialize to the JSON shape Plotly.js accepts, so the
//! rendered `<div>` only needs the Plotly bundle on the embedding page.

use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::StatsResult;

/// Single axis value: numeric score or categorical label.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Datum {
    Number(f64),
    Text(String),
}

impl From<f64> for Datum {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u64> for Datum {
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<String> for Datum {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BarTrace {
    pub x: Vec<Datum>,
    pub y: Vec<Datum>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PieTrace {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
    pub hoverinfo: String,
    pub textinfo: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeatmapTrace {
    /// `None` cells serialize as `null` (no answers for that pair).
    pub z: Vec<Vec<Option<f64>>>,
    pub x: Vec<String>,
    pub y: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Bar(BarTrace),
    Pie(PieTrace),
    Heatmap(HeatmapTrace),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titlefont: Option<Font>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickfont: Option<Font>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickvals: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showticklabels: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automargin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
}

impl Axis {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    /// Keyed `xaxis`, `yaxis`, `xaxis2`, ... as Plotly expects.
    #[serde(flatten)]
    pub axes: BTreeMap<String, Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl Layout {
    pub fn with_axes(xaxis: Axis, yaxis: Axis) -> Self {
        let mut layout = Self::default();
        layout.axes.insert("xaxis".to_string(), xaxis);
        layout.axes.insert("yaxis".to_string(), yaxis);
        layout
    }

    pub fn axis(&self, key: &str) -> Option<&Axis> {
        self.axes.get(key)
    }

    pub fn axis_mut(&mut self, key: &str) -> &mut Axis {
        self.axes.entry(key.to_string()).or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    pub fn bar_traces(&self) -> impl Iterator<Item = &BarTrace> {
        self.data.iter().filter_map(|trace| match trace {
            Trace::Bar(bar) => Some(bar),
            _ => None,
        })
    }
}

/// Rendered chart: the specification plus its embeddable markup.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub figure: Figure,
    pub html: String,
}

impl Chart {
    pub fn render(figure: Figure) -> StatsResult<Self> {
        let html = render_div(&figure)?;
        Ok(Self { figure, html })
    }
}

/// Renders a figure as a self-contained `<div>` + `<script>` fragment.
pub fn render_div(figure: &Figure) -> StatsResult<String> {
    let div_id = Uuid::new_v4();
    let data = script_safe_json(&figure.data)?;
    let layout = script_safe_json(&figure.layout)?;
    Ok(format!(
        "<div id=\"{div_id}\" style=\"height:100%; width:100%;\" class=\"plotly-graph-div\"></div>\
<script type=\"text/javascript\">window.PLOTLYENV=window.PLOTLYENV || {{}};\
if (document.getElementById(\"{div_id}\")) {{\
Plotly.newPlot(\"{div_id}\", {data}, {layout}, {{\"showLink\": false}})\
}};</script>"
    ))
}

fn script_safe_json<T: Serialize>(value: &T) -> StatsResult<String> {
    let json = serde_json::to_string(value)?;
    Ok(json.replace("</", "<\\/"))
}
