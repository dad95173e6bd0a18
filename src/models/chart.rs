use serde::Serialize;

use crate::models::usage::ChartSlice;

pub const PIE_TITLE: &str = "High level Disk Usage Distribution";

/// Plotly-shaped pie figure, serialized as `{"data":[…],"layout":{…}}`.
/// The frontend hands this straight to Plotly, so the field names follow its
/// figure schema rather than Rust conventions.
#[derive(Debug, Clone, Serialize)]
pub struct PieFigure {
    pub data: Vec<PieTrace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize)]
pub struct PieTrace {
    #[serde(rename = "type")]
    pub trace_type: &'static str,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub title: Title,
}

#[derive(Debug, Clone, Serialize)]
pub struct Title {
    pub text: String,
}

impl PieFigure {
    pub fn from_slices(slices: &[ChartSlice]) -> Self {
        Self {
            data: vec![PieTrace {
                trace_type: "pie",
                labels: slices.iter().map(|s| s.filesystem.clone()).collect(),
                values: slices.iter().map(|s| s.usage_percent).collect(),
            }],
            layout: Layout {
                title: Title { text: PIE_TITLE.to_string() },
            },
        }
    }
}
