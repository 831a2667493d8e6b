//! Plotly figure assembly
//!
//! Turns a [`TraceLayout`] into a Plotly figure description: one trace per
//! layout entry, in layout order, and two dropdown menus whose buttons switch
//! the visible traces to a selection's range.
//!
//! Menu 0 selects a whole run, menu 1 selects one request within a run.

use crate::layout::{Selection, SelectionKey, SeriesKind, TraceLayout, TraceRange, TraceSpec};
use crate::stats::{mean, percentile_of_sorted};
use crate::store::{AggregateStore, RequestAggregate};
use serde::Serialize;
use std::collections::BTreeMap;

const BAR_COLORS: [&str; 6] = [
    "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#08519c",
];
const MEAN_COLOR: &str = "#d62728";

/// Options that shape the rendered chart
#[derive(Debug, Clone, PartialEq)]
pub struct FigureOptions {
    pub title: String,
    /// Width of the time buckets on the x axis, in seconds
    pub bucket_secs: u64,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self {
            title: "Gatling percentiles".to_string(),
            bucket_secs: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Line {
    pub color: String,
    pub width: f64,
}

/// One Plotly trace
#[derive(Debug, Clone, Serialize)]
pub struct PlotTrace {
    #[serde(rename = "type")]
    pub trace_type: &'static str,
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub hovertext: Vec<String>,
    pub hoverinfo: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    pub legendgroup: String,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisibilityUpdate {
    pub visible: Vec<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TitleUpdate {
    #[serde(rename = "title.text")]
    pub title_text: String,
}

/// A dropdown button; `args.0.visible` is the trace mask
#[derive(Debug, Clone, Serialize)]
pub struct Button {
    pub label: String,
    pub method: &'static str,
    pub args: (VisibilityUpdate, TitleUpdate),
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateMenu {
    pub buttons: Vec<Button>,
    pub direction: &'static str,
    pub showactive: bool,
    pub active: usize,
    pub x: f64,
    pub y: f64,
    pub xanchor: &'static str,
    pub yanchor: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub title: Title,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlotLayout {
    pub title: Title,
    pub barmode: &'static str,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub updatemenus: Vec<UpdateMenu>,
    pub showlegend: bool,
}

/// Serializable Plotly figure (`{"data": [...], "layout": {...}}`)
#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<PlotTrace>,
    pub layout: PlotLayout,
}

impl Figure {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// A dropdown entry and the traces it reveals
#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    pub label: String,
    pub key: SelectionKey,
    pub range: TraceRange,
}

/// Dropdown-to-trace-range mapping of an assembled figure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibilityMap {
    pub runs: Vec<MenuEntry>,
    pub requests: Vec<MenuEntry>,
}

/// A figure together with the ranges its buttons select
#[derive(Debug, Clone)]
pub struct AssembledFigure {
    pub figure: Figure,
    pub visibility: VisibilityMap,
}

/// Per-bucket values for one request
struct Buckets {
    x: Vec<f64>,
    sorted: Vec<Vec<u64>>,
}

impl Buckets {
    fn of(aggregate: &RequestAggregate, origin_ms: u64, bucket_secs: u64) -> Self {
        let bucket_secs = bucket_secs.max(1);
        let width_ms = bucket_secs.saturating_mul(1_000);
        let mut grouped: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
        for (&ts, &rt) in aggregate
            .start_timestamps()
            .iter()
            .zip(aggregate.response_times())
        {
            let bucket = ts.saturating_sub(origin_ms) / width_ms;
            grouped.entry(bucket).or_default().push(rt);
        }

        let mut x = Vec::with_capacity(grouped.len());
        let mut sorted = Vec::with_capacity(grouped.len());
        for (bucket, mut values) in grouped {
            values.sort_unstable();
            x.push(bucket.saturating_mul(bucket_secs) as f64);
            sorted.push(values);
        }
        Self { x, sorted }
    }

    fn percentile(&self, p: f64) -> Vec<f64> {
        self.sorted
            .iter()
            .map(|values| percentile_of_sorted(values, p))
            .collect()
    }

    fn mean(&self) -> Vec<f64> {
        self.sorted.iter().map(|values| mean(values)).collect()
    }
}

fn selection_label(selection: &Selection, multiple_runs: bool) -> String {
    match &selection.key {
        SelectionKey::Run(run) => run.to_string(),
        SelectionKey::Request(run, path) if multiple_runs => format!("{} / {}", run, path),
        SelectionKey::Request(_, path) => path.to_string(),
    }
}

/// Build the traces for one request block. `specs` are the layout entries of
/// the block, in order.
fn request_traces(
    specs: &[TraceSpec],
    aggregate: &RequestAggregate,
    origin_ms: u64,
    options: &FigureOptions,
) -> Vec<PlotTrace> {
    let buckets = Buckets::of(aggregate, origin_ms, options.bucket_secs);
    let mut previous: Option<Vec<f64>> = None;
    let mut bar_index = 0;

    specs
        .iter()
        .map(|spec| {
            let legendgroup = spec.path.to_string();
            let name = format!("{} {}", spec.kind.label(), spec.path);
            match spec.kind {
                SeriesKind::Percentile(p) => {
                    let values = buckets.percentile(p);
                    // Stacked segment: height above the previous percentile
                    let y = match &previous {
                        Some(prev) => values
                            .iter()
                            .zip(prev)
                            .map(|(v, below)| (v - below).max(0.0))
                            .collect(),
                        None => values.clone(),
                    };
                    let hovertext = values
                        .iter()
                        .map(|v| format!("{}: {:.1} ms", spec.kind.label(), v))
                        .collect();
                    let color = BAR_COLORS[bar_index % BAR_COLORS.len()];
                    bar_index += 1;
                    previous = Some(values);
                    PlotTrace {
                        trace_type: "bar",
                        name,
                        x: buckets.x.clone(),
                        y,
                        hovertext,
                        hoverinfo: "text+name",
                        mode: None,
                        legendgroup,
                        visible: false,
                        marker: Some(Marker {
                            color: color.to_string(),
                        }),
                        line: None,
                    }
                }
                SeriesKind::Mean => {
                    let y = buckets.mean();
                    let hovertext = y.iter().map(|v| format!("mean: {:.1} ms", v)).collect();
                    PlotTrace {
                        trace_type: "scatter",
                        name,
                        x: buckets.x.clone(),
                        y,
                        hovertext,
                        hoverinfo: "text+name",
                        mode: Some("lines+markers"),
                        legendgroup,
                        visible: false,
                        marker: Some(Marker {
                            color: MEAN_COLOR.to_string(),
                        }),
                        line: Some(Line {
                            color: MEAN_COLOR.to_string(),
                            width: 2.0,
                        }),
                    }
                }
            }
        })
        .collect()
}

fn menu(entries: &[MenuEntry], total: usize, title: &str, y: f64) -> UpdateMenu {
    UpdateMenu {
        buttons: entries
            .iter()
            .map(|entry| Button {
                label: entry.label.clone(),
                method: "update",
                args: (
                    VisibilityUpdate {
                        visible: entry.range.visibility(total),
                    },
                    TitleUpdate {
                        title_text: format!("{}: {}", title, entry.label),
                    },
                ),
            })
            .collect(),
        direction: "down",
        showactive: true,
        active: 0,
        x: 0.0,
        y,
        xanchor: "left",
        yanchor: "top",
    }
}

/// Assemble the figure for `layout`. Initially the first request of the first
/// run is visible.
pub fn assemble(
    store: &AggregateStore,
    layout: &TraceLayout,
    options: &FigureOptions,
) -> crate::error::Result<AssembledFigure> {
    let mut data = Vec::with_capacity(layout.len());

    for selection in layout.request_selections() {
        let SelectionKey::Request(run_key, path) = &selection.key else {
            continue;
        };
        let aggregate = store.get_request_data(&run_key.simulation, &run_key.run, path)?;
        let origin_ms = store
            .get_run_summary(&run_key.simulation, &run_key.run)?
            .first_timestamp_ms
            .unwrap_or(0);
        let specs = &layout.traces()[selection.range.start..=selection.range.end];
        data.extend(request_traces(specs, aggregate, origin_ms, options));
    }

    let multiple_runs = layout.run_selections().len() > 1;
    let visibility = VisibilityMap {
        runs: layout
            .run_selections()
            .iter()
            .map(|s| MenuEntry {
                label: selection_label(s, multiple_runs),
                key: s.key.clone(),
                range: s.range,
            })
            .collect(),
        requests: layout
            .request_selections()
            .iter()
            .map(|s| MenuEntry {
                label: selection_label(s, multiple_runs),
                key: s.key.clone(),
                range: s.range,
            })
            .collect(),
    };

    if let Some(first) = visibility.requests.first() {
        for i in first.range.indices() {
            data[i].visible = true;
        }
    }

    let title = match visibility.requests.first() {
        Some(first) => format!("{}: {}", options.title, first.label),
        None => options.title.clone(),
    };

    let total = data.len();
    let figure = Figure {
        data,
        layout: PlotLayout {
            title: Title { text: title },
            barmode: "stack",
            xaxis: Axis {
                title: Title {
                    text: format!("time since run start (s, {}s buckets)", options.bucket_secs),
                },
            },
            yaxis: Axis {
                title: Title {
                    text: "response time (ms)".to_string(),
                },
            },
            updatemenus: vec![
                menu(&visibility.runs, total, &options.title, 1.15),
                menu(&visibility.requests, total, &options.title, 1.08),
            ],
            showlegend: true,
        },
    };

    Ok(AssembledFigure { figure, visibility })
}
