//! JSON output format for aggregated statistics
//!
//! Mirrors the store hierarchy: simulations, their runs, and per-request
//! statistics, all in store enumeration order.

use crate::identity::FullRequestPath;
use crate::stats::Statistics;
use crate::store::{AggregateStore, RunSummary};
use serde::Serialize;

/// Statistics for one request
#[derive(Debug, Clone, Serialize)]
pub struct JsonRequest {
    /// Display form of the full request path (`Group|Sub|name`)
    pub path: FullRequestPath,
    /// Group hierarchy, outermost first
    pub hierarchy: Vec<String>,
    pub name: String,
    pub ko: usize,
    pub statistics: Statistics,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRun {
    pub id: String,
    pub summary: RunSummary,
    pub requests: Vec<JsonRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonSimulation {
    pub id: String,
    pub runs: Vec<JsonRun>,
}

/// Complete JSON document
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    pub version: String,
    pub percentiles: Vec<f64>,
    pub simulations: Vec<JsonSimulation>,
}

impl JsonReport {
    pub fn from_store(store: &AggregateStore) -> Self {
        let simulations = store
            .simulations()
            .iter()
            .map(|sim| JsonSimulation {
                id: sim.id().to_string(),
                runs: sim
                    .runs()
                    .iter()
                    .map(|run| JsonRun {
                        id: run.id().to_string(),
                        summary: run.summary().clone(),
                        requests: run
                            .requests()
                            .iter()
                            .map(|agg| JsonRequest {
                                path: agg.path().clone(),
                                hierarchy: agg.path().hierarchy().to_vec(),
                                name: agg.path().name().to_string(),
                                ko: agg.ko_count(),
                                statistics: agg.statistics().clone(),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            version: crate::build_version().to_string(),
            percentiles: store.percentiles().to_vec(),
            simulations,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
