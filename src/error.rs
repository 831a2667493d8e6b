//! Error types shared by ingestion, queries and configuration

use thiserror::Error;

/// Errors produced while loading simulation logs or querying aggregates
#[derive(Error, Debug)]
pub enum GstatError {
    /// A record is missing a required field or carries a malformed value.
    #[error("{source_name}:{line}: invalid field `{field}`: {reason}")]
    Data {
        source_name: String,
        line: u64,
        field: &'static str,
        reason: String,
    },

    #[error("no data for simulation `{simulation}`, run `{run}`{}", path_suffix(.path))]
    NotFound {
        simulation: String,
        run: String,
        path: Option<String>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no runs found under {0}")]
    NoRuns(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn path_suffix(path: &Option<String>) -> String {
    match path {
        Some(p) => format!(", request `{}`", p),
        None => String::new(),
    }
}

impl GstatError {
    pub(crate) fn data(
        source_name: &str,
        line: u64,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        GstatError::Data {
            source_name: source_name.to_string(),
            line,
            field,
            reason: reason.into(),
        }
    }
}

/// Result alias for gstat library operations
pub type Result<T> = std::result::Result<T, GstatError>;
