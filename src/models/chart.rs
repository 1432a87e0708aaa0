use serde::{Deserialize, Serialize};

/// Plotly figure: traces plus layout, serialised as-is for Plotly.js
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDocument {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[cfg(test)]
impl ChartDocument {
    pub fn trace(&self, name: &str) -> Option<&Trace> {
        self.data.iter().find(|t| t.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: String,
    pub mode: String,
    pub name: String,
    pub legendgroup: String,
    pub showlegend: bool,
    pub x: Vec<String>,
    /// `null` entries leave a gap in the line
    pub y: Vec<Option<f64>>,
    pub line: Line,
}

impl Trace {
    pub fn line(name: &str, x: Vec<String>, y: Vec<Option<f64>>, color: &str, show_legend: bool) -> Self {
        Self {
            kind: "scatter".to_string(),
            mode: "lines".to_string(),
            name: name.to_string(),
            legendgroup: name.to_string(),
            showlegend: show_legend,
            x,
            y,
            line: Line { color: color.to_string() },
        }
    }

    /// Number of points that carry a value
    #[cfg(test)]
    pub fn point_count(&self) -> usize {
        self.y.iter().filter(|v| v.is_some()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub font: Font,
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub title: Title,
    pub showgrid: bool,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub title: Title,
    pub plot_bgcolor: String,
    pub paper_bgcolor: String,
    pub legend: Legend,
    pub xaxis: Axis,
    pub yaxis: Axis,
}
