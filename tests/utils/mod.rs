// Shared helpers for building results directories in integration tests

use std::fs;
use std::path::{Path, PathBuf};

pub const HEADER: &str = "record_type,scenario_name,group_hierarchy,request_name,status,start_timestamp,end_timestamp,response_time_ms,message";

/// Checked-in results directory under tests/fixtures
pub fn fixture_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Write `<root>/<run>/simulation.csv` with the standard header and `rows`
pub fn write_run(root: &Path, run: &str, rows: &[&str]) {
    let dir = root.join(run);
    fs::create_dir_all(&dir).expect("create run directory");
    let mut contents = String::from(HEADER);
    for row in rows {
        contents.push('\n');
        contents.push_str(row);
    }
    contents.push('\n');
    fs::write(dir.join("simulation.csv"), contents).expect("write simulation log");
}
