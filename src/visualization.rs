//! Visualization module: interactive chart artifacts for the analysis.
//!
//! Produces self-contained HTML documents that load plotly.js from its CDN:
//! - Choropleth world maps keyed by country name (coffee, happiness, partitions)
//! - Scatter plots with median quadrants, a least-squares line, and bubbles
//!
//! All drawing is done client-side by plotly. This module turns enriched
//! records into figure JSON (traces + layout) and emits the HTML shell.
use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::classify::{EnrichedRecord, Partition};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::schema::{artifact, UNKNOWN_CONTINENT};
use crate::stats::LinearFit;
use crate::summary::DatasetSummary;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const PLOT_WIDTH: u32 = 1000;
const PLOT_HEIGHT: u32 = 800;
const COFFEE_AXIS: &str = "Coffee Consumption (kg/capita)";
const HAPPINESS_AXIS: &str = "Happiness Score";

// ── Figure ──────────────────────────────────────────────────────────────────

/// Plotly figure: a list of traces and a layout object.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub traces: Vec<Value>,
    pub layout: Value,
}

/// One output artifact: a figure and the file name it is written under.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub file_name: &'static str,
    pub title: String,
    pub figure: Figure,
}

impl Chart {
    /// Render the chart as a standalone HTML page.
    pub fn to_html(&self) -> Result<String> {
        let traces = script_safe(serde_json::to_string(&self.figure.traces)?);
        let layout = script_safe(serde_json::to_string(&self.figure.layout)?);

        let html = format!(
            r##"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8" />
  <title>{title}</title>
  <script src="{cdn}"></script>
</head>
<body style="margin:0; background:#fff;">
  <div id="chart" style="width:100%; height:100vh;"></div>
  <script>
    Plotly.newPlot("chart", {traces}, {layout}, {{responsive: true}});
  </script>
</body>
</html>
"##,
            title = escape_html(&self.title),
            cdn = PLOTLY_CDN,
            traces = traces,
            layout = layout,
        );
        Ok(html)
    }
}

/// Every chart the run produces. The bubble chart is left out when no record
/// carries a daily cup count.
pub fn all_charts(
    records: &[EnrichedRecord],
    summary: &DatasetSummary,
    config: &AnalysisConfig,
) -> Vec<Chart> {
    let mut charts = vec![
        coffee_map(records, config),
        happiness_map(records, config),
        intersection_map(records, summary, config),
        quadrant_plot(records, summary, config),
        correlation_plot(records, summary, config),
    ];
    charts.extend(bubble_chart(records, config));
    charts
}

// ── Maps ────────────────────────────────────────────────────────────────────

/// Binary colorscale: `base` below 0.5, `high` from 0.5 up.
fn binary_colorscale(base: &str, high: &str) -> Value {
    json!([[0.0, base], [0.5, base], [0.5, high], [1.0, high]])
}

fn flag_choropleth(
    records: &[EnrichedRecord],
    flag: impl Fn(&EnrichedRecord) -> bool,
    hover: impl Fn(&EnrichedRecord) -> String,
    colorbar_title: &str,
    base: &str,
    high: &str,
) -> Value {
    let locations: Vec<&str> = records.iter().map(|r| r.country()).collect();
    let z: Vec<u8> = records.iter().map(|r| u8::from(flag(r))).collect();
    let text: Vec<String> = records.iter().map(hover).collect();
    json!({
        "type": "choropleth",
        "locations": locations,
        "locationmode": "country names",
        "z": z,
        "zmin": 0,
        "zmax": 1,
        "text": text,
        "hoverinfo": "text",
        "colorscale": binary_colorscale(base, high),
        "showscale": true,
        "colorbar": {
            "title": { "text": colorbar_title, "side": "top" },
            "tickmode": "array",
            "tickvals": [0, 1],
            "ticktext": ["Low", "High"],
            "ticks": "outside",
            "thickness": 20,
            "len": 0.3,
            "orientation": "h",
            "x": 0.5,
            "y": 0,
            "yanchor": "top"
        }
    })
}

pub fn coffee_map(records: &[EnrichedRecord], config: &AnalysisConfig) -> Chart {
    let trace = flag_choropleth(
        records,
        |r| r.is_high_coffee,
        |r| {
            format!(
                "{}<br>Consumption: {:.2} kg/capita<br>Category: {}",
                r.country(),
                r.coffee(),
                r.category
            )
        },
        "Coffee Consumption",
        &config.colors.base,
        &config.colors.coffee_only,
    );
    let title = format!(
        "Coffee Consumption Per Capita (≥{} kg)",
        config.coffee_threshold
    );
    Chart {
        file_name: artifact::COFFEE_MAP,
        figure: Figure {
            traces: vec![trace],
            layout: map_layout(&title, config, false),
        },
        title,
    }
}

pub fn happiness_map(records: &[EnrichedRecord], config: &AnalysisConfig) -> Chart {
    let trace = flag_choropleth(
        records,
        |r| r.is_high_happiness,
        |r| format!("{}<br>Happiness Score: {:.2}", r.country(), r.happiness()),
        "Happiness Score",
        &config.colors.base,
        &config.colors.happiness_only,
    );
    let title = format!("Happiness Score (≥{})", config.happiness_threshold);
    Chart {
        file_name: artifact::HAPPINESS_MAP,
        figure: Figure {
            traces: vec![trace],
            layout: map_layout(&title, config, false),
        },
        title,
    }
}

fn partition_color(partition: Partition, config: &AnalysisConfig) -> &str {
    match partition {
        Partition::Both => &config.colors.intersection,
        Partition::CoffeeOnly => &config.colors.coffee_only,
        Partition::HappinessOnly => &config.colors.happiness_only,
        Partition::Neither => &config.colors.base,
    }
}

/// One flat-colored layer per highlighted partition, plus legend markers.
pub fn intersection_map(
    records: &[EnrichedRecord],
    summary: &DatasetSummary,
    config: &AnalysisConfig,
) -> Chart {
    const LAYERS: [Partition; 3] = [
        Partition::CoffeeOnly,
        Partition::HappinessOnly,
        Partition::Both,
    ];

    let mut traces = Vec::new();

    // Geo choropleths carry no legend entries; marker-only traces stand in.
    for partition in LAYERS {
        traces.push(json!({
            "type": "scattergeo",
            "lon": [null],
            "lat": [null],
            "mode": "markers",
            "marker": { "size": 10, "color": partition_color(partition, config) },
            "name": partition.label(),
            "showlegend": true,
            "hoverinfo": "skip"
        }));
    }

    for partition in LAYERS {
        let members: Vec<&EnrichedRecord> =
            records.iter().filter(|r| r.partition == partition).collect();
        if members.is_empty() {
            continue;
        }
        let color = partition_color(partition, config);
        let locations: Vec<&str> = members.iter().map(|r| r.country()).collect();
        let text: Vec<String> = members
            .iter()
            .map(|r| {
                format!(
                    "{}<br>Coffee: {:.2} kg/capita<br>Happiness: {:.2}",
                    r.country(),
                    r.coffee(),
                    r.happiness()
                )
            })
            .collect();
        traces.push(json!({
            "type": "choropleth",
            "locations": locations,
            "locationmode": "country names",
            "z": vec![1; members.len()],
            "text": text,
            "hoverinfo": "text",
            "colorscale": [[0.0, color], [1.0, color]],
            "showscale": false,
            "showlegend": false,
            "name": partition.label()
        }));
    }

    let title = format!(
        "Coffee Consumption Per Capita (≥{} kg) and Happiness Score (≥{}) Distribution<br>\
         Both: {:.1}% | High Coffee Consumption Only: {:.1}% | High Happiness Only: {:.1}%",
        config.coffee_threshold,
        config.happiness_threshold,
        summary.partition(Partition::Both).percentage,
        summary.partition(Partition::CoffeeOnly).percentage,
        summary.partition(Partition::HappinessOnly).percentage,
    );

    Chart {
        file_name: artifact::INTERSECTION_MAP,
        figure: Figure {
            traces,
            layout: map_layout(&title, config, true),
        },
        title,
    }
}

fn map_layout(title: &str, config: &AnalysisConfig, legend: bool) -> Value {
    let (top, bottom) = if legend { (100, 150) } else { (80, 50) };
    let mut layout = json!({
        "title": { "text": title, "x": 0.5, "y": 0.95, "font": { "size": 20 } },
        "geo": {
            "showframe": false,
            "showcoastlines": true,
            "projection": { "type": "equirectangular" },
            "showland": true,
            "landcolor": "lightgray",
            "showcountries": true,
            "countrycolor": "white"
        },
        "width": config.map.width,
        "height": config.map.height,
        "template": "plotly_white",
        "showlegend": legend,
        "margin": { "r": 50, "l": 50, "t": top, "b": bottom },
        "annotations": watermark(config)
    });
    if legend {
        layout["legend"] = json!({
            "orientation": "h",
            "yanchor": "bottom",
            "y": -0.15,
            "xanchor": "center",
            "x": 0.5,
            "bgcolor": "rgba(255,255,255,0.8)",
            "bordercolor": "gray",
            "borderwidth": 1
        });
    }
    layout
}

// ── Scatter plots ───────────────────────────────────────────────────────────

fn by_continent(records: &[EnrichedRecord]) -> BTreeMap<&str, Vec<&EnrichedRecord>> {
    let mut groups: BTreeMap<&str, Vec<&EnrichedRecord>> = BTreeMap::new();
    for r in records {
        let continent = r.record.continent.as_deref().unwrap_or(UNKNOWN_CONTINENT);
        groups.entry(continent).or_default().push(r);
    }
    groups
}

fn scatter_trace(name: &str, members: &[&EnrichedRecord]) -> Value {
    let x: Vec<f64> = members.iter().map(|r| r.coffee()).collect();
    let y: Vec<f64> = members.iter().map(|r| r.happiness()).collect();
    let text: Vec<&str> = members.iter().map(|r| r.country()).collect();
    json!({
        "type": "scatter",
        "mode": "markers",
        "name": name,
        "x": x,
        "y": y,
        "text": text,
        "hovertemplate": "%{text}<br>Coffee: %{x:.2f} kg/capita<br>Happiness: %{y:.2f}<extra></extra>"
    })
}

/// Least-squares line across the observed consumption range.
fn trend_trace(fit: &LinearFit, records: &[EnrichedRecord]) -> Value {
    let x_min = records.iter().map(|r| r.coffee()).fold(f64::INFINITY, f64::min);
    let x_max = records
        .iter()
        .map(|r| r.coffee())
        .fold(f64::NEG_INFINITY, f64::max);
    json!({
        "type": "scatter",
        "mode": "lines",
        "name": "OLS trendline",
        "x": [x_min, x_max],
        "y": [fit.predict(x_min), fit.predict(x_max)],
        "line": { "color": "gray" },
        "hovertemplate": format!(
            "y = {:.3}x + {:.3}<extra></extra>",
            fit.slope, fit.intercept
        )
    })
}

fn scatter_layout(title: &str, config: &AnalysisConfig, legend_on_top: bool) -> Value {
    let mut layout = json!({
        "title": { "text": title },
        "xaxis": { "title": { "text": COFFEE_AXIS } },
        "yaxis": { "title": { "text": HAPPINESS_AXIS } },
        "width": PLOT_WIDTH,
        "height": PLOT_HEIGHT,
        "template": "plotly_white",
        "annotations": watermark(config)
    });
    if legend_on_top {
        layout["showlegend"] = json!(true);
        layout["legend"] = json!({
            "orientation": "h",
            "yanchor": "bottom",
            "y": 1.02,
            "xanchor": "right",
            "x": 1
        });
    }
    layout
}

/// Scatter by continent, split into quadrants at the medians of both fields.
pub fn quadrant_plot(
    records: &[EnrichedRecord],
    summary: &DatasetSummary,
    config: &AnalysisConfig,
) -> Chart {
    let mut traces: Vec<Value> = by_continent(records)
        .iter()
        .map(|(continent, members)| scatter_trace(continent, members))
        .collect();
    if let Some(fit) = &summary.fit {
        traces.push(trend_trace(fit, records));
    }

    let cx = summary.coffee_median;
    let hy = summary.happiness_median;
    let title = "Coffee Consumption vs Happiness Score by Continent".to_string();
    let mut layout = scatter_layout(&title, config, true);

    let dashed = |x0: Value, x1: Value, y0: Value, y1: Value, xref: &str, yref: &str| {
        json!({
            "type": "line",
            "x0": x0, "x1": x1, "y0": y0, "y1": y1,
            "xref": xref, "yref": yref,
            "line": { "dash": "dash", "color": "gray" }
        })
    };
    layout["shapes"] = json!([
        dashed(json!(cx), json!(cx), json!(0), json!(1), "x", "paper"),
        dashed(json!(0), json!(1), json!(hy), json!(hy), "paper", "y"),
    ]);

    let quadrant = |x: f64, y: f64, text: &str| {
        json!({ "x": x, "y": y, "text": text, "showarrow": false, "font": { "size": 12 } })
    };
    if let Some(annotations) = layout["annotations"].as_array_mut() {
        annotations.extend([
            quadrant(cx / 2.0, hy * 1.1, "Low Coffee<br>High Happiness"),
            quadrant(cx * 1.5, hy * 1.1, "High Coffee<br>High Happiness"),
            quadrant(cx / 2.0, hy * 0.9, "Low Coffee<br>Low Happiness"),
            quadrant(cx * 1.5, hy * 0.9, "High Coffee<br>Low Happiness"),
        ]);
    }

    Chart {
        file_name: artifact::QUADRANT_PLOT,
        title,
        figure: Figure { traces, layout },
    }
}

/// Correlation label for titles: three decimals, or "undefined".
pub fn correlation_label(correlation: Option<f64>) -> String {
    match correlation {
        Some(r) => format!("{r:.3}"),
        None => "undefined".to_string(),
    }
}

pub fn correlation_plot(
    records: &[EnrichedRecord],
    summary: &DatasetSummary,
    config: &AnalysisConfig,
) -> Chart {
    let all: Vec<&EnrichedRecord> = records.iter().collect();
    let mut traces = vec![scatter_trace("Countries", &all)];
    if let Some(fit) = &summary.fit {
        traces.push(trend_trace(fit, records));
    }
    let title = format!(
        "Coffee Consumption vs Happiness Score (r = {})",
        correlation_label(summary.correlation)
    );
    Chart {
        file_name: artifact::CORRELATION_PLOT,
        figure: Figure {
            traces,
            layout: scatter_layout(&title, config, false),
        },
        title,
    }
}

/// Bubble size follows daily cups; `None` when no record has that field.
pub fn bubble_chart(records: &[EnrichedRecord], config: &AnalysisConfig) -> Option<Chart> {
    let sized: Vec<EnrichedRecord> = records
        .iter()
        .filter(|r| r.record.daily_coffee_cups.is_some())
        .cloned()
        .collect();
    if sized.is_empty() {
        return None;
    }

    let max_cups = sized
        .iter()
        .filter_map(|r| r.record.daily_coffee_cups)
        .fold(0.0, f64::max);
    // Largest bubble about 40px across.
    let sizeref = if max_cups > 0.0 {
        2.0 * max_cups / (40.0 * 40.0)
    } else {
        1.0
    };

    let traces: Vec<Value> = by_continent(&sized)
        .iter()
        .map(|(continent, members)| {
            let mut trace = scatter_trace(continent, members);
            let sizes: Vec<f64> = members
                .iter()
                .map(|r| r.record.daily_coffee_cups.unwrap_or(0.0))
                .collect();
            trace["marker"] = json!({
                "size": sizes,
                "sizemode": "area",
                "sizeref": sizeref,
                "sizemin": 4
            });
            trace["hovertemplate"] = json!(
                "%{text}<br>Coffee: %{x:.2f} kg/capita<br>Happiness: %{y:.2f}<br>Daily cups: %{marker.size}<extra></extra>"
            );
            trace
        })
        .collect();

    let title = "Coffee Consumption vs Happiness Score by Continent and Daily Cups".to_string();
    Some(Chart {
        file_name: artifact::BUBBLE_CHART,
        figure: Figure {
            traces,
            layout: scatter_layout(&title, config, true),
        },
        title,
    })
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn watermark(config: &AnalysisConfig) -> Value {
    match &config.watermark {
        Some(text) => json!([{
            "text": text,
            "xref": "paper",
            "yref": "paper",
            "x": 0.98,
            "y": 0.02,
            "showarrow": false,
            "font": { "size": 10, "color": "gray" },
            "opacity": 0.7
        }]),
        None => json!([]),
    }
}

/// Keep serialized JSON from closing the surrounding script element.
fn script_safe(json: String) -> String {
    json.replace("</", "<\\/")
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
