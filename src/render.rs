//! Chart rendering boundary.
//!
//! The pipeline hands finished [`SeriesSummary`] values to a [`ChartRenderer`]
//! and does not look at what comes out. [`HtmlChartRenderer`] writes a
//! standalone plotly.js page with one stacked panel per attribute.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::models::SeriesSummary;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

// ---

/// Global display settings shared by all panels.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    // ---
    pub title: String,
    pub window_hours: f64,
    pub mean_color: String,
    pub paper_background: String,
    pub plot_background: String,
    pub grid_color: String,
    pub text_color: String,
    /// d3 time format for x tick labels.
    pub tick_format: String,
    pub height: u32,
}

impl DisplayConfig {
    // ---
    /// Dark palette used for the environment dashboard.
    pub fn new(window_hours: f64) -> Self {
        Self {
            title: format!("Environment monitoring – recent readings ({window_hours}h window)"),
            window_hours,
            mean_color: "#d1d5db".to_string(),
            paper_background: "#020617".to_string(),
            plot_background: "#0f172a".to_string(),
            grid_color: "rgba(148,163,184,0.25)".to_string(),
            text_color: "#e5e7eb".to_string(),
            tick_format: "%d/%m %H:%M".to_string(),
            height: 900,
        }
    }
}

/// Consumer of the pipeline's output.
pub trait ChartRenderer {
    fn render(&self, summaries: &[SeriesSummary], display: &DisplayConfig) -> Result<()>;
}

/// Writes the chart as a self-contained HTML file.
#[derive(Debug, Clone)]
pub struct HtmlChartRenderer {
    output: PathBuf,
}

impl HtmlChartRenderer {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }
}

impl ChartRenderer for HtmlChartRenderer {
    // ---
    fn render(&self, summaries: &[SeriesSummary], display: &DisplayConfig) -> Result<()> {
        // ---
        let page = html_page(&figure(summaries, display), &display.title)?;
        std::fs::write(&self.output, page)
            .with_context(|| format!("Failed to write chart to {}", self.output.display()))?;

        info!("Chart written to {}", self.output.display());
        Ok(())
    }
}

/// Build the plotly figure (`{data, layout}`) for the given summaries.
///
/// Panel `i` (1-based) plots against the shared `x` axis and its own `y{i}`
/// axis. Empty summaries keep their panel but contribute no traces.
pub fn figure(summaries: &[SeriesSummary], display: &DisplayConfig) -> Value {
    // ---
    let mut data = Vec::new();
    let mut layout = Map::new();
    let mut subplots = Vec::new();

    for (i, summary) in summaries.iter().enumerate() {
        let axis = axis_suffix(i);
        subplots.push(json!([format!("xy{axis}")]));

        layout.insert(
            format!("yaxis{axis}"),
            json!({
                "title": { "text": format!("{} ({})", summary.label, summary.unit) },
                "showgrid": true,
                "gridcolor": display.grid_color,
                "zeroline": false,
            }),
        );

        let Some(mean) = summary.mean else {
            continue;
        };

        let x: Vec<String> = summary
            .series
            .timestamps()
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
            .collect();
        let y: Vec<f64> = summary.series.values().collect();

        data.push(json!({
            "type": "scatter",
            "mode": "lines+markers",
            "name": summary.label,
            "x": x,
            "y": y,
            "xaxis": "x",
            "yaxis": format!("y{axis}"),
            "line": { "color": summary.color, "width": 3 },
            "marker": { "size": 8, "color": summary.color },
            "hovertemplate": format!("{}: %{{y:.2f}} {}<br>%{{x}}<extra></extra>", summary.label, summary.unit),
        }));

        data.push(json!({
            "type": "scatter",
            "mode": "lines",
            "name": format!("Mean {} ({:.2} {})", summary.label, mean, summary.unit),
            "x": x,
            "y": vec![mean; x.len()],
            "xaxis": "x",
            "yaxis": format!("y{axis}"),
            "line": { "color": display.mean_color, "width": 2, "dash": "dash" },
            "hovertemplate": format!("Mean: {:.2} {}<extra></extra>", mean, summary.unit),
        }));
    }

    layout.insert(
        "grid".to_string(),
        json!({
            "rows": summaries.len().max(1),
            "columns": 1,
            "subplots": subplots,
            "roworder": "top to bottom",
            "ygap": 0.2,
        }),
    );
    layout.insert(
        "xaxis".to_string(),
        json!({
            "showgrid": true,
            "gridcolor": display.grid_color,
            "zeroline": false,
            "tickformat": display.tick_format,
        }),
    );
    layout.insert("height".to_string(), json!(display.height));
    layout.insert("plot_bgcolor".to_string(), json!(display.plot_background));
    layout.insert("paper_bgcolor".to_string(), json!(display.paper_background));
    layout.insert(
        "font".to_string(),
        json!({
            "color": display.text_color,
            "family": "system-ui, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif",
        }),
    );
    layout.insert(
        "title".to_string(),
        json!({ "text": display.title, "x": 0.5, "font": { "size": 20, "color": display.text_color } }),
    );
    layout.insert(
        "legend".to_string(),
        json!({
            "orientation": "v",
            "x": 1.02,
            "y": 1,
            "bordercolor": display.text_color,
            "borderwidth": 1,
            "bgcolor": "rgba(15,23,42,0.9)",
            "font": { "size": 11 },
        }),
    );

    json!({ "data": data, "layout": Value::Object(layout) })
}

/// Plotly names the first axis `y`, then `y2`, `y3`, ...
fn axis_suffix(index: usize) -> String {
    if index == 0 {
        String::new()
    } else {
        (index + 1).to_string()
    }
}

fn html_page(figure: &Value, title: &str) -> Result<String> {
    // ---
    // Keep the embedded JSON from closing the script element early.
    let figure = serde_json::to_string(figure)?.replace("</", "<\\/");
    let title = title
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{PLOTLY_CDN}"></script>
</head>
<body style="margin:0;background:#020617">
<div id="chart"></div>
<script>
const figure = {figure};
Plotly.newPlot("chart", figure.data, figure.layout, {{responsive: true}});
</script>
</body>
</html>
"#
    ))
}
