//! Loaded dataset snapshots
//!
//! A [`DatasetSnapshot`] owns one frozen [`AggregateStore`] together with a
//! fingerprint of the log files it was built from. Readers share the store
//! through an `Arc`; a refresh builds a fresh store and swaps it in only when
//! the fingerprint changed, leaving earlier `Arc`s untouched.
//!
//! The CLI loads once through [`DatasetSnapshot::load`]; long-lived callers
//! embedding the library poll [`DatasetSnapshot::refresh`] instead.

use crate::config::GstatConfig;
use crate::discovery::{discover_runs, load_results};
use crate::error::Result;
use crate::store::AggregateStore;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

/// Digest of run names, log sizes and modification times under `root`
pub fn fingerprint(root: &Path) -> Result<String> {
    let mut hasher = Sha256::new();
    for location in discover_runs(root)? {
        let metadata = std::fs::metadata(&location.log_path)?;
        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_nanos());
        hasher.update(location.run.as_bytes());
        hasher.update([0u8]);
        hasher.update(metadata.len().to_le_bytes());
        hasher.update(modified.to_le_bytes());
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Owned, reloadable view of a results directory
#[derive(Debug)]
pub struct DatasetSnapshot {
    root: PathBuf,
    config: GstatConfig,
    fingerprint: String,
    store: Arc<AggregateStore>,
}

impl DatasetSnapshot {
    pub fn load(root: &Path, config: GstatConfig) -> Result<Self> {
        let fingerprint = fingerprint(root)?;
        let store = load_results(root, &config)?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
            fingerprint,
            store: Arc::new(store),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &GstatConfig {
        &self.config
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Shared handle to the current store
    pub fn store(&self) -> Arc<AggregateStore> {
        Arc::clone(&self.store)
    }

    /// Whether the files on disk differ from what this snapshot was built from
    pub fn is_stale(&self) -> Result<bool> {
        Ok(fingerprint(&self.root)? != self.fingerprint)
    }

    /// Reload if the input changed. Returns `true` when a new store was built.
    pub fn refresh(&mut self) -> Result<bool> {
        let current = fingerprint(&self.root)?;
        if current == self.fingerprint {
            return Ok(false);
        }
        let store = load_results(&self.root, &self.config)?;
        tracing::info!("reloaded dataset from {}", self.root.display());
        self.store = Arc::new(store);
        self.fingerprint = current;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::LOG_FILE_NAME;
    use std::fs;

    const HEADER: &str = "record_type,scenario_name,group_hierarchy,request_name,status,start_timestamp,end_timestamp,response_time_ms,message\n";

    fn write_run(root: &Path, name: &str, body: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(LOG_FILE_NAME), format!("{}{}", HEADER, body)).unwrap();
    }

    #[test]
    fn test_refresh_without_changes_keeps_store() {
        let dir = tempfile::tempdir().unwrap();
        write_run(dir.path(), "basic-1", "request,S,A,X,OK,1,2,1,\n");

        let mut snapshot = DatasetSnapshot::load(dir.path(), GstatConfig::default()).unwrap();
        let before = snapshot.store();
        assert!(!snapshot.is_stale().unwrap());
        assert!(!snapshot.refresh().unwrap());
        assert!(Arc::ptr_eq(&before, &snapshot.store()));
    }

    #[test]
    fn test_refresh_picks_up_new_run() {
        let dir = tempfile::tempdir().unwrap();
        write_run(dir.path(), "basic-1", "request,S,A,X,OK,1,2,1,\n");

        let mut snapshot = DatasetSnapshot::load(dir.path(), GstatConfig::default()).unwrap();
        let before = snapshot.store();
        let old_fingerprint = snapshot.fingerprint().to_string();

        write_run(dir.path(), "basic-2", "request,S,A,X,OK,1,2,1,\n");
        assert!(snapshot.is_stale().unwrap());
        assert!(snapshot.refresh().unwrap());
        assert_ne!(snapshot.fingerprint(), old_fingerprint);

        assert_eq!(snapshot.store().get_runs("basic").unwrap().len(), 2);
        // Readers holding the old snapshot still see the old data
        assert_eq!(before.get_runs("basic").unwrap().len(), 1);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        write_run(dir.path(), "basic-1", "request,S,A,X,OK,1,2,1,\n");
        assert_eq!(
            fingerprint(dir.path()).unwrap(),
            fingerprint(dir.path()).unwrap()
        );
        assert_eq!(fingerprint(dir.path()).unwrap().len(), 64);
    }
}
