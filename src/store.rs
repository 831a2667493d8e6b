//! Aggregate store
//!
//! Response-time observations bucketed per (simulation, run, full request
//! path). A [`StoreBuilder`] is the only writer; [`StoreBuilder::build`] freezes
//! it into an [`AggregateStore`] that exposes queries only.
//!
//! Every enumeration (simulations, runs, requests) is in first-seen order, so
//! loading the same input twice yields the same order.

use crate::error::{GstatError, Result};
use crate::identity::FullRequestPath;
use crate::record::{LogRecord, RequestEvent, Status, UserEvent, UserLifecycle};
use crate::stats::{self, Statistics, DEFAULT_PERCENTILES};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Observations for one distinct request within a run
#[derive(Debug)]
pub struct RequestAggregate {
    path: FullRequestPath,
    response_times: Vec<u64>,
    start_timestamps: Vec<u64>,
    ko_count: usize,
    percentiles: Arc<[f64]>,
    statistics: OnceLock<Statistics>,
}

impl RequestAggregate {
    fn new(path: FullRequestPath, percentiles: Arc<[f64]>) -> Self {
        Self {
            path,
            response_times: Vec::new(),
            start_timestamps: Vec::new(),
            ko_count: 0,
            percentiles,
            statistics: OnceLock::new(),
        }
    }

    fn push(&mut self, event: &RequestEvent) {
        self.response_times.push(event.response_time_ms);
        self.start_timestamps.push(event.start_timestamp_ms);
        if event.status == Status::Ko {
            self.ko_count += 1;
        }
        self.statistics.take();
    }

    fn absorb(&mut self, other: RequestAggregate) {
        self.response_times.extend(other.response_times);
        self.start_timestamps.extend(other.start_timestamps);
        self.ko_count += other.ko_count;
        self.statistics.take();
    }

    pub fn path(&self) -> &FullRequestPath {
        &self.path
    }

    pub fn count(&self) -> usize {
        self.response_times.len()
    }

    /// Response times in log order
    pub fn response_times(&self) -> &[u64] {
        &self.response_times
    }

    /// Request start timestamps (epoch ms), parallel to [`Self::response_times`]
    pub fn start_timestamps(&self) -> &[u64] {
        &self.start_timestamps
    }

    pub fn ko_count(&self) -> usize {
        self.ko_count
    }

    pub fn ok_count(&self) -> usize {
        self.count() - self.ko_count
    }

    pub fn mean(&self) -> f64 {
        self.statistics().mean
    }

    /// Statistics over all observations, computed on first use
    pub fn statistics(&self) -> &Statistics {
        self.statistics
            .get_or_init(|| Statistics::compute(&self.response_times, &self.percentiles))
    }

    pub fn percentile(&self, p: f64) -> f64 {
        self.statistics().percentile(p).unwrap_or_else(|| {
            let mut sorted = self.response_times.clone();
            sorted.sort_unstable();
            stats::percentile_of_sorted(&sorted, p)
        })
    }
}

/// Run-level counters derived from user and request events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Scenario names in first-seen order
    pub scenarios: Vec<String>,
    pub users_started: u64,
    pub users_ended: u64,
    pub requests: u64,
    pub ko_requests: u64,
    pub first_timestamp_ms: Option<u64>,
    pub last_timestamp_ms: Option<u64>,
}

impl RunSummary {
    fn observe_timestamp(&mut self, ts: u64) {
        self.first_timestamp_ms = Some(self.first_timestamp_ms.map_or(ts, |t| t.min(ts)));
        self.last_timestamp_ms = Some(self.last_timestamp_ms.map_or(ts, |t| t.max(ts)));
    }

    fn observe_scenario(&mut self, scenario: &str) {
        if !self.scenarios.iter().any(|s| s == scenario) {
            self.scenarios.push(scenario.to_string());
        }
    }

    /// Wall-clock span of the run in milliseconds
    pub fn duration_ms(&self) -> u64 {
        match (self.first_timestamp_ms, self.last_timestamp_ms) {
            (Some(first), Some(last)) => last - first,
            _ => 0,
        }
    }

    fn merge(&mut self, other: &RunSummary) {
        for scenario in &other.scenarios {
            self.observe_scenario(scenario);
        }
        self.users_started += other.users_started;
        self.users_ended += other.users_ended;
        self.requests += other.requests;
        self.ko_requests += other.ko_requests;
        if let Some(ts) = other.first_timestamp_ms {
            self.observe_timestamp(ts);
        }
        if let Some(ts) = other.last_timestamp_ms {
            self.observe_timestamp(ts);
        }
    }
}

/// One execution of a simulation
#[derive(Debug)]
pub struct RunData {
    id: String,
    source: Option<PathBuf>,
    summary: RunSummary,
    requests: Vec<RequestAggregate>,
    index: HashMap<FullRequestPath, usize>,
    percentiles: Arc<[f64]>,
}

impl RunData {
    /// Start an empty run. Records are added with [`RunData::ingest`] and the
    /// run is handed to [`StoreBuilder::insert_run`] once complete.
    pub fn new(id: &str, percentiles: &[f64]) -> Self {
        Self::with_shared_percentiles(id, Arc::from(percentiles))
    }

    fn with_shared_percentiles(id: &str, percentiles: Arc<[f64]>) -> Self {
        Self {
            id: id.to_string(),
            source: None,
            summary: RunSummary::default(),
            requests: Vec::new(),
            index: HashMap::new(),
            percentiles,
        }
    }

    pub fn with_source(mut self, source: &Path) -> Self {
        self.source = Some(source.to_path_buf());
        self
    }

    /// Route a record into this run
    pub fn ingest(&mut self, record: &LogRecord) {
        match record {
            LogRecord::User(user) => self.ingest_user(user),
            LogRecord::Request(request) => self.ingest_request(request),
        }
    }

    fn ingest_user(&mut self, user: &UserEvent) {
        self.summary.observe_scenario(&user.scenario_name);
        self.summary.observe_timestamp(user.timestamp_ms);
        match user.lifecycle {
            UserLifecycle::Start => self.summary.users_started += 1,
            UserLifecycle::End => self.summary.users_ended += 1,
        }
    }

    fn ingest_request(&mut self, request: &RequestEvent) {
        self.summary.observe_scenario(&request.scenario_name);
        self.summary.observe_timestamp(request.start_timestamp_ms);
        self.summary.observe_timestamp(request.end_timestamp_ms);
        self.summary.requests += 1;
        if request.status == Status::Ko {
            self.summary.ko_requests += 1;
        }

        let path = request.full_path();
        let slot = match self.index.get(&path) {
            Some(&i) => i,
            None => {
                self.requests.push(RequestAggregate::new(
                    path.clone(),
                    Arc::clone(&self.percentiles),
                ));
                self.index.insert(path, self.requests.len() - 1);
                self.requests.len() - 1
            }
        };
        self.requests[slot].push(request);
    }

    /// Report `percentiles` from now on, dropping statistics computed for
    /// any other set
    fn adopt_percentiles(&mut self, percentiles: &Arc<[f64]>) {
        if self.percentiles[..] == percentiles[..] {
            return;
        }
        self.percentiles = Arc::clone(percentiles);
        for aggregate in &mut self.requests {
            aggregate.percentiles = Arc::clone(percentiles);
            aggregate.statistics.take();
        }
    }

    fn merge(&mut self, other: RunData) {
        self.summary.merge(&other.summary);
        for aggregate in other.requests {
            match self.index.get(aggregate.path()) {
                Some(&i) => self.requests[i].absorb(aggregate),
                None => {
                    self.index.insert(aggregate.path().clone(), self.requests.len());
                    self.requests.push(aggregate);
                }
            }
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Log file this run was loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Aggregates in first-seen order
    pub fn requests(&self) -> &[RequestAggregate] {
        &self.requests
    }

    pub fn request(&self, path: &FullRequestPath) -> Option<&RequestAggregate> {
        self.index.get(path).map(|&i| &self.requests[i])
    }
}

/// A named simulation and its runs
#[derive(Debug)]
pub struct SimulationData {
    id: String,
    runs: Vec<RunData>,
    index: HashMap<String, usize>,
}

impl SimulationData {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            runs: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Runs in first-seen order
    pub fn runs(&self) -> &[RunData] {
        &self.runs
    }

    pub fn run(&self, id: &str) -> Option<&RunData> {
        self.index.get(id).map(|&i| &self.runs[i])
    }
}

#[derive(Debug)]
struct Simulations {
    simulations: Vec<SimulationData>,
    index: HashMap<String, usize>,
}

impl Simulations {
    fn get(&self, id: &str) -> Option<&SimulationData> {
        self.index.get(id).map(|&i| &self.simulations[i])
    }

    fn get_or_insert(&mut self, id: &str) -> &mut SimulationData {
        let slot = match self.index.get(id) {
            Some(&i) => i,
            None => {
                self.simulations.push(SimulationData::new(id));
                self.index.insert(id.to_string(), self.simulations.len() - 1);
                self.simulations.len() - 1
            }
        };
        &mut self.simulations[slot]
    }
}

/// Mutable store used during ingestion
#[derive(Debug)]
pub struct StoreBuilder {
    inner: Simulations,
    percentiles: Arc<[f64]>,
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new(&DEFAULT_PERCENTILES)
    }
}

impl StoreBuilder {
    /// Create a builder whose aggregates report `percentiles`
    pub fn new(percentiles: &[f64]) -> Self {
        Self {
            inner: Simulations {
                simulations: Vec::new(),
                index: HashMap::new(),
            },
            percentiles: Arc::from(percentiles),
        }
    }

    pub fn percentiles(&self) -> &[f64] {
        &self.percentiles
    }

    /// Route one record into the bucket for (`simulation`, `run`)
    pub fn ingest(&mut self, simulation: &str, run: &str, record: &LogRecord) {
        let percentiles = Arc::clone(&self.percentiles);
        let sim = self.inner.get_or_insert(simulation);
        let slot = match sim.index.get(run) {
            Some(&i) => i,
            None => {
                sim.runs.push(RunData::with_shared_percentiles(run, percentiles));
                sim.index.insert(run.to_string(), sim.runs.len() - 1);
                sim.runs.len() - 1
            }
        };
        sim.runs[slot].ingest(record);
    }

    /// Add a fully ingested run. A run id already present in the simulation
    /// has the new observations appended to it. The run reports this
    /// builder's percentiles regardless of what it was created with.
    pub fn insert_run(&mut self, simulation: &str, mut run: RunData) {
        run.adopt_percentiles(&self.percentiles);
        let sim = self.inner.get_or_insert(simulation);
        match sim.index.get(run.id()) {
            Some(&i) => sim.runs[i].merge(run),
            None => {
                sim.index.insert(run.id().to_string(), sim.runs.len());
                sim.runs.push(run);
            }
        }
    }

    /// Freeze into a read-only store
    pub fn build(self) -> AggregateStore {
        AggregateStore {
            inner: self.inner,
            percentiles: self.percentiles,
        }
    }
}

/// Read-only aggregate store
#[derive(Debug)]
pub struct AggregateStore {
    inner: Simulations,
    percentiles: Arc<[f64]>,
}

impl AggregateStore {
    /// Percentiles reported by every aggregate in this store
    pub fn percentiles(&self) -> &[f64] {
        &self.percentiles
    }

    pub fn is_empty(&self) -> bool {
        self.inner.simulations.is_empty()
    }

    /// Simulations in first-seen order
    pub fn simulations(&self) -> &[SimulationData] {
        &self.inner.simulations
    }

    pub fn get_simulations(&self) -> Vec<&str> {
        self.inner.simulations.iter().map(|s| s.id()).collect()
    }

    pub fn get_runs(&self, simulation: &str) -> Result<Vec<&str>> {
        let sim = self.simulation(simulation)?;
        Ok(sim.runs.iter().map(|r| r.id()).collect())
    }

    pub fn get_requests(&self, simulation: &str, run: &str) -> Result<Vec<&FullRequestPath>> {
        let run = self.run(simulation, run)?;
        Ok(run.requests.iter().map(|r| r.path()).collect())
    }

    pub fn get_request_data(
        &self,
        simulation: &str,
        run: &str,
        path: &FullRequestPath,
    ) -> Result<&RequestAggregate> {
        self.run(simulation, run)?
            .request(path)
            .ok_or_else(|| GstatError::NotFound {
                simulation: simulation.to_string(),
                run: run.to_string(),
                path: Some(path.to_string()),
            })
    }

    pub fn get_run_summary(&self, simulation: &str, run: &str) -> Result<&RunSummary> {
        Ok(self.run(simulation, run)?.summary())
    }

    pub fn simulation(&self, simulation: &str) -> Result<&SimulationData> {
        self.inner
            .get(simulation)
            .ok_or_else(|| GstatError::NotFound {
                simulation: simulation.to_string(),
                run: String::new(),
                path: None,
            })
    }

    pub fn run(&self, simulation: &str, run: &str) -> Result<&RunData> {
        self.simulation(simulation)?
            .run(run)
            .ok_or_else(|| GstatError::NotFound {
                simulation: simulation.to_string(),
                run: run.to_string(),
                path: None,
            })
    }

    /// Total number of request observations across all runs
    pub fn total_requests(&self) -> usize {
        self.inner
            .simulations
            .iter()
            .flat_map(|s| s.runs.iter())
            .flat_map(|r| r.requests.iter())
            .map(|a| a.count())
            .sum()
    }
}
