//! CLI argument parsing for gstat

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Interactive HTML page with the percentile chart (default)
    Html,
    /// Human-readable summary tables
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

impl OutputFormat {
    /// File written when `--output` is not given; `None` means stdout
    pub fn default_output(self) -> Option<&'static str> {
        match self {
            OutputFormat::Html => Some("gstat-report.html"),
            OutputFormat::Text | OutputFormat::Json | OutputFormat::Csv => None,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "gstat")]
#[command(version = crate::build_version())]
#[command(about = "Percentile charts and statistics for Gatling simulation logs", long_about = None)]
pub struct Cli {
    /// Results directory containing `<simulation>-<timestamp>/simulation.csv` runs
    #[arg(value_name = "RESULTS_DIR")]
    pub results_dir: PathBuf,

    /// Write the report to FILE (`-` for stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "html")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Comma-separated percentiles, e.g. 50,90,99,100
    #[arg(short = 'p', long = "percentiles", value_name = "LIST")]
    pub percentiles: Option<String>,

    /// Chart time bucket width in seconds
    #[arg(long = "bucket-secs", value_name = "SECS")]
    pub bucket_secs: Option<u64>,

    /// Only keep requests whose full path matches REGEX (prefix with `!` to exclude)
    #[arg(short = 'e', long = "filter", value_name = "REGEX")]
    pub filter: Option<String>,

    /// Chart and page title
    #[arg(long = "title", value_name = "TITLE")]
    pub title: Option<String>,

    /// Skip runs with malformed records instead of failing
    #[arg(long = "skip-invalid-runs")]
    pub skip_invalid_runs: bool,

    /// Enable debug logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
