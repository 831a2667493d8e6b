//! Run discovery and loading
//!
//! A results directory holds one subdirectory per run, named
//! `<simulation>-<timestamp>` and containing `simulation.csv`. Runs of the
//! same simulation are grouped under the simulation name.
//!
//! Each run is parsed completely before it is added to the store, so a
//! malformed record either fails the load or drops the whole run; a run is
//! never partially ingested.

use crate::config::GstatConfig;
use crate::error::{GstatError, Result};
use crate::filter::RequestFilter;
use crate::record::{LogRecord, RecordReader};
use crate::store::{AggregateStore, RunData, StoreBuilder};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of a run's log inside its directory
pub const LOG_FILE_NAME: &str = "simulation.csv";

/// A run found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLocation {
    pub simulation: String,
    pub run: String,
    pub log_path: PathBuf,
}

/// Split a run directory name into its simulation name. `basic-20240101` is
/// simulation `basic`; a name without a numeric suffix is its own simulation.
pub fn simulation_name(run_dir_name: &str) -> &str {
    match run_dir_name.rsplit_once('-') {
        Some((name, suffix))
            if !name.is_empty()
                && !suffix.is_empty()
                && suffix.chars().all(|c| c.is_ascii_digit()) =>
        {
            name
        }
        _ => run_dir_name,
    }
}

fn location_for(dir: &Path) -> RunLocation {
    let run = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string());
    RunLocation {
        simulation: simulation_name(&run).to_string(),
        log_path: dir.join(LOG_FILE_NAME),
        run,
    }
}

/// Find runs under `root`, sorted by directory name. If `root` itself holds a
/// log it is the only run.
pub fn discover_runs(root: &Path) -> Result<Vec<RunLocation>> {
    if root.join(LOG_FILE_NAME).is_file() {
        return Ok(vec![location_for(root)]);
    }

    let mut runs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() && path.join(LOG_FILE_NAME).is_file() {
            runs.push(location_for(&path));
        } else if path.is_dir() {
            debug!("skipping {}: no {}", path.display(), LOG_FILE_NAME);
        }
    }
    runs.sort_by(|a, b| a.run.cmp(&b.run));
    Ok(runs)
}

/// Parse every record of one run. The first invalid record aborts the run.
pub fn read_run<R: Read>(
    reader: RecordReader<R>,
    run_id: &str,
    percentiles: &[f64],
    filter: &RequestFilter,
) -> Result<RunData> {
    let mut run = RunData::new(run_id, percentiles);
    let mut filtered = 0usize;
    for record in reader {
        let record = record?;
        if let LogRecord::Request(request) = &record {
            if !filter.matches(&request.full_path()) {
                filtered += 1;
                continue;
            }
        }
        run.ingest(&record);
    }
    if filtered > 0 {
        debug!("run {}: {} requests excluded by filter", run_id, filtered);
    }
    Ok(run)
}

/// Load one run from disk
pub fn load_run(
    location: &RunLocation,
    percentiles: &[f64],
    filter: &RequestFilter,
) -> Result<RunData> {
    let reader = RecordReader::from_path(&location.log_path)?;
    let run = read_run(reader, &location.run, percentiles, filter)?;
    debug!(
        "loaded run {} ({} requests, {} distinct)",
        location.run,
        run.summary().requests,
        run.requests().len()
    );
    Ok(run.with_source(&location.log_path))
}

/// Discover, parse and aggregate every run under `root`
pub fn load_results(root: &Path, config: &GstatConfig) -> Result<AggregateStore> {
    config.validate()?;
    let filter = config.request_filter()?;
    let locations = discover_runs(root)?;
    if locations.is_empty() {
        return Err(GstatError::NoRuns(root.display().to_string()));
    }

    let mut builder = StoreBuilder::new(&config.percentiles);
    let mut skipped = 0usize;
    for location in &locations {
        match load_run(location, &config.percentiles, &filter) {
            Ok(run) => builder.insert_run(&location.simulation, run),
            Err(err @ GstatError::Data { .. }) if config.skip_invalid_runs => {
                warn!("skipping run {}: {}", location.run, err);
                skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }

    let store = builder.build();
    if store.is_empty() {
        return Err(GstatError::NoRuns(root.display().to_string()));
    }
    info!(
        "loaded {} runs ({} skipped) with {} requests from {}",
        locations.len() - skipped,
        skipped,
        store.total_requests(),
        root.display()
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HEADER: &str = "record_type,scenario_name,group_hierarchy,request_name,status,start_timestamp,end_timestamp,response_time_ms,message\n";

    fn write_run(root: &Path, name: &str, body: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(LOG_FILE_NAME), format!("{}{}", HEADER, body)).unwrap();
    }

    #[test]
    fn test_simulation_name() {
        assert_eq!(
            simulation_name("basicsimulation-20240101120000"),
            "basicsimulation"
        );
        assert_eq!(simulation_name("checkout-flow-17"), "checkout-flow");
        assert_eq!(simulation_name("adhoc"), "adhoc");
        assert_eq!(simulation_name("adhoc-final"), "adhoc-final");
        assert_eq!(simulation_name("-123"), "-123");
    }

    #[test]
    fn test_discover_sorted_and_skips_non_runs() {
        let dir = tempfile::tempdir().unwrap();
        write_run(dir.path(), "basic-2", "");
        write_run(dir.path(), "basic-1", "");
        fs::create_dir_all(dir.path().join("empty-3")).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let runs = discover_runs(dir.path()).unwrap();
        let names: Vec<&str> = runs.iter().map(|r| r.run.as_str()).collect();
        assert_eq!(names, vec!["basic-1", "basic-2"]);
        assert!(runs.iter().all(|r| r.simulation == "basic"));
    }

    #[test]
    fn test_root_with_log_is_single_run() {
        let dir = tempfile::tempdir().unwrap();
        write_run(dir.path(), "solo-42", "");
        let runs = discover_runs(&dir.path().join("solo-42")).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].simulation, "solo");
    }

    #[test]
    fn test_load_results_groups_runs_by_simulation() {
        let dir = tempfile::tempdir().unwrap();
        write_run(dir.path(), "basic-1", "request,S,A,X,OK,1,2,1,\n");
        write_run(dir.path(), "basic-2", "request,S,A,X,OK,1,3,2,\n");
        write_run(dir.path(), "other-1", "request,S,,Y,OK,1,4,3,\n");

        let store = load_results(dir.path(), &GstatConfig::default()).unwrap();
        assert_eq!(store.get_simulations(), vec!["basic", "other"]);
        assert_eq!(store.get_runs("basic").unwrap(), vec!["basic-1", "basic-2"]);
        let run = store.run("basic", "basic-1").unwrap();
        assert!(run.source().unwrap().ends_with("basic-1/simulation.csv"));
    }

    #[test]
    fn test_invalid_run_fails_load_by_default() {
        let dir = tempfile::tempdir().unwrap();
        write_run(dir.path(), "basic-1", "request,S,A,X,OK,1,2,1,\n");
        write_run(dir.path(), "basic-2", "request,S,A,,OK,1,2,1,\n");

        let err = load_results(dir.path(), &GstatConfig::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("basic-2"));
        assert!(message.contains("request_name"));
    }

    #[test]
    fn test_invalid_run_dropped_whole_when_skipping() {
        let dir = tempfile::tempdir().unwrap();
        write_run(dir.path(), "basic-1", "request,S,A,X,OK,1,2,1,\n");
        write_run(
            dir.path(),
            "basic-2",
            "request,S,A,X,OK,1,2,1,\nrequest,S,A,X,OK,1,2,oops,\n",
        );

        let config = GstatConfig {
            skip_invalid_runs: true,
            ..GstatConfig::default()
        };
        let store = load_results(dir.path(), &config).unwrap();
        assert_eq!(store.get_runs("basic").unwrap(), vec!["basic-1"]);
    }

    #[test]
    fn test_empty_results_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_results(dir.path(), &GstatConfig::default()),
            Err(GstatError::NoRuns(_))
        ));
    }

    #[test]
    fn test_request_filter_applies_during_load() {
        let dir = tempfile::tempdir().unwrap();
        write_run(
            dir.path(),
            "basic-1",
            "request,S,A,X,OK,1,2,1,\nrequest,S,,health,OK,1,2,1,\n",
        );
        let config = GstatConfig {
            request_filter: Some("!health".to_string()),
            ..GstatConfig::default()
        };
        let store = load_results(dir.path(), &config).unwrap();
        let requests = store.get_requests("basic", "basic-1").unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].to_string(), "A|X");
    }
}
