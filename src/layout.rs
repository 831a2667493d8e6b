//! Trace layout planning
//!
//! Every (run, request, series) combination gets one position in a single
//! flat trace list. Each request's series are emitted back to back before the
//! next request starts, so a request's traces always form one contiguous
//! block, and a run's block is exactly the concatenation of its requests'
//! blocks. Dropdown buttons then only need an index range to decide which
//! traces to show.

use crate::identity::FullRequestPath;
use crate::stats::percentile_label;
use crate::store::AggregateStore;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// One visual series drawn for a request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SeriesKind {
    /// Stacked bar segment ending at this percentile
    Percentile(f64),
    /// Mean response time line
    Mean,
}

impl SeriesKind {
    pub fn label(&self) -> String {
        match self {
            SeriesKind::Percentile(p) => percentile_label(*p),
            SeriesKind::Mean => "mean".to_string(),
        }
    }
}

/// The series drawn for every request: one bar per percentile, then the mean
/// line. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSet {
    kinds: Vec<SeriesKind>,
}

impl SeriesSet {
    pub fn for_percentiles(percentiles: &[f64]) -> Self {
        let mut kinds: Vec<SeriesKind> = percentiles
            .iter()
            .map(|&p| SeriesKind::Percentile(p))
            .collect();
        kinds.push(SeriesKind::Mean);
        Self { kinds }
    }

    pub fn kinds(&self) -> &[SeriesKind] {
        &self.kinds
    }

    /// Number of traces emitted per request
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn bar_count(&self) -> usize {
        self.kinds
            .iter()
            .filter(|k| matches!(k, SeriesKind::Percentile(_)))
            .count()
    }
}

/// Identifies a run across simulations
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RunKey {
    pub simulation: String,
    pub run: String,
}

impl RunKey {
    pub fn new(simulation: &str, run: &str) -> Self {
        Self {
            simulation: simulation.to_string(),
            run: run.to_string(),
        }
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.run)
    }
}

/// A dropdown entry: a whole run, or one request within a run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectionKey {
    Run(RunKey),
    Request(RunKey, FullRequestPath),
}

impl SelectionKey {
    pub fn run(&self) -> &RunKey {
        match self {
            SelectionKey::Run(run) | SelectionKey::Request(run, _) => run,
        }
    }
}

/// Inclusive range of trace indices. `start <= end` always holds, so a range
/// covers at least one trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TraceRange {
    pub start: usize,
    pub end: usize,
}

impl TraceRange {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always `false`: an inclusive range holds at least `start`
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }

    pub fn overlaps(&self, other: &TraceRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn indices(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }

    /// Visibility mask over `total` traces, true exactly inside this range
    pub fn visibility(&self, total: usize) -> Vec<bool> {
        (0..total).map(|i| self.contains(i)).collect()
    }
}

/// One drawable series in the flat trace list
#[derive(Debug, Clone, PartialEq)]
pub struct TraceSpec {
    pub index: usize,
    pub run: RunKey,
    pub path: FullRequestPath,
    pub kind: SeriesKind,
}

/// A selectable item and the traces it shows
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub key: SelectionKey,
    pub range: TraceRange,
}

/// Flat trace list plus the visibility range of every selectable item
#[derive(Debug, Clone)]
pub struct TraceLayout {
    series: SeriesSet,
    traces: Vec<TraceSpec>,
    runs: Vec<Selection>,
    requests: Vec<Selection>,
    ranges: HashMap<SelectionKey, TraceRange>,
}

impl TraceLayout {
    /// Lay out every request of every run in store order.
    ///
    /// Runs without requests get no selection.
    pub fn plan(store: &AggregateStore, series: &SeriesSet) -> Self {
        let mut traces = Vec::new();
        let mut runs = Vec::new();
        let mut requests = Vec::new();

        for simulation in store.simulations() {
            for run in simulation.runs() {
                let run_key = RunKey::new(simulation.id(), run.id());
                let run_start = traces.len();

                for aggregate in run.requests() {
                    let start = traces.len();
                    for kind in series.kinds() {
                        traces.push(TraceSpec {
                            index: traces.len(),
                            run: run_key.clone(),
                            path: aggregate.path().clone(),
                            kind: *kind,
                        });
                    }
                    requests.push(Selection {
                        key: SelectionKey::Request(run_key.clone(), aggregate.path().clone()),
                        range: TraceRange {
                            start,
                            end: traces.len() - 1,
                        },
                    });
                }

                if traces.len() == run_start {
                    tracing::debug!(
                        "run {} has no requests, leaving it out of the chart",
                        run_key
                    );
                    continue;
                }
                runs.push(Selection {
                    key: SelectionKey::Run(run_key),
                    range: TraceRange {
                        start: run_start,
                        end: traces.len() - 1,
                    },
                });
            }
        }

        let ranges = runs
            .iter()
            .chain(requests.iter())
            .map(|s| (s.key.clone(), s.range))
            .collect();

        tracing::debug!(
            "planned {} traces for {} runs and {} requests",
            traces.len(),
            runs.len(),
            requests.len()
        );

        Self {
            series: series.clone(),
            traces,
            runs,
            requests,
            ranges,
        }
    }

    pub fn series(&self) -> &SeriesSet {
        &self.series
    }

    /// All traces in emission order; `traces()[i].index == i`
    pub fn traces(&self) -> &[TraceSpec] {
        &self.traces
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Run selections in emission order
    pub fn run_selections(&self) -> &[Selection] {
        &self.runs
    }

    /// Request selections in emission order
    pub fn request_selections(&self) -> &[Selection] {
        &self.requests
    }

    /// Request selections belonging to one run
    pub fn requests_of<'a>(
        &'a self,
        run: &'a RunKey,
    ) -> impl Iterator<Item = &'a Selection> + 'a {
        self.requests.iter().filter(move |s| s.key.run() == run)
    }

    pub fn range(&self, key: &SelectionKey) -> Option<TraceRange> {
        self.ranges.get(key).copied()
    }

    pub fn visibility(&self, key: &SelectionKey) -> Option<Vec<bool>> {
        self.range(key).map(|r| r.visibility(self.traces.len()))
    }
}
