//! gstat - Percentile charts and statistics for Gatling simulation logs
//!
//! This library discovers simulation runs in a results directory, aggregates
//! response times per request (keyed by group hierarchy and request name),
//! computes percentile statistics, and lays out an interactive chart whose
//! run and request selectors toggle contiguous ranges of traces.

pub mod cli;
pub mod config;
pub mod csv_output;
pub mod discovery;
pub mod error;
pub mod figure;
pub mod filter;
pub mod html_output;
pub mod identity;
pub mod json_output;
pub mod layout;
pub mod record;
pub mod snapshot;
pub mod stats;
pub mod store;
pub mod text_output;

pub use error::{GstatError, Result};
pub use identity::FullRequestPath;
pub use store::AggregateStore;

/// Version string embedded at build time (`git describe` when available)
pub fn build_version() -> &'static str {
    option_env!("GSTAT_BUILD_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_build_version_not_empty() {
        assert!(!super::build_version().is_empty());
    }
}
