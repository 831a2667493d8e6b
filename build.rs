// build.rs: embed a git-derived version string as GSTAT_BUILD_VERSION.
//
// Format: `X.Y.Z` on a clean checkout of a tag, `X.Y.Z+sha` past the latest
// tag, `0.0.0+sha` when no tag exists, with `.dirty` appended for local
// changes. Each git call is bounded to one second; outside a git checkout
// the package version is used.

use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const GIT_TIMEOUT: Duration = Duration::from_secs(1);

/// Run `git <args>` and return trimmed stdout, or None on failure or timeout
fn git(args: &[&str]) -> Option<String> {
    let mut child = Command::new("git")
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) if status.success() => break,
            Ok(Some(_)) | Err(_) => return None,
            Ok(None) if started.elapsed() >= GIT_TIMEOUT => {
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
            Ok(None) => thread::sleep(Duration::from_millis(10)),
        }
    }

    let output = child.wait_with_output().ok()?;
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn git_version() -> Option<String> {
    let sha = git(&["rev-parse", "--short", "HEAD"])?;
    let dirty = git(&["status", "--porcelain", "--untracked-files=no"]).is_some();

    let mut version = match git(&["describe", "--tags", "--abbrev=0"]) {
        Some(tag) => {
            let base = tag.trim_start_matches('v').to_string();
            let exact = git(&["describe", "--tags", "--exact-match"]).is_some();
            if exact {
                base
            } else {
                format!("{}+{}", base, sha)
            }
        }
        None => format!("0.0.0+{}", sha),
    };

    if dirty {
        if !version.contains('+') {
            version.push('+');
            version.push_str(&sha);
        }
        version.push_str(".dirty");
    }
    Some(version)
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
    println!("cargo:rerun-if-changed=.git/refs/tags");

    let version = git_version()
        .unwrap_or_else(|| std::env::var("CARGO_PKG_VERSION").unwrap_or_default());

    println!("cargo:rustc-env=GSTAT_BUILD_VERSION={}", version);
}
