//! Report configuration
//!
//! Loaded from an optional TOML file; every field has a default so an empty
//! file (or no file) is valid. Command-line flags override file values.
//!
//! ```toml
//! percentiles = [50.0, 90.0, 99.0, 100.0]
//! bucket_secs = 5
//! skip_invalid_runs = true
//! request_filter = "^Checkout\\|"
//! title = "Nightly soak test"
//! ```

use crate::error::{GstatError, Result};
use crate::figure::FigureOptions;
use crate::filter::RequestFilter;
use crate::stats::DEFAULT_PERCENTILES;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Widest accepted chart bucket: one day
pub const MAX_BUCKET_SECS: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GstatConfig {
    /// Percentiles drawn as stacked bars, ascending
    #[serde(default = "default_percentiles")]
    pub percentiles: Vec<f64>,

    /// Width of chart time buckets in seconds
    #[serde(default = "default_bucket_secs")]
    pub bucket_secs: u64,

    /// Drop runs with malformed records instead of failing the whole load
    pub skip_invalid_runs: bool,

    /// Only keep requests whose full path matches this regex
    pub request_filter: Option<String>,

    #[serde(default = "default_title")]
    pub title: String,
}

fn default_percentiles() -> Vec<f64> {
    DEFAULT_PERCENTILES.to_vec()
}

fn default_bucket_secs() -> u64 {
    1
}

fn default_title() -> String {
    "Gatling percentiles".to_string()
}

impl Default for GstatConfig {
    fn default() -> Self {
        Self {
            percentiles: default_percentiles(),
            bucket_secs: default_bucket_secs(),
            skip_invalid_runs: false,
            request_filter: None,
            title: default_title(),
        }
    }
}

impl GstatConfig {
    /// Load and validate a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text).map_err(|e| match e {
            GstatError::Config(msg) => GstatError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: GstatConfig =
            toml::from_str(text).map_err(|e| GstatError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a comma-separated percentile list such as `50,95,99.9`
    pub fn parse_percentiles(list: &str) -> Result<Vec<f64>> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<f64>()
                    .map_err(|_| GstatError::Config(format!("invalid percentile `{}`", s)))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.percentiles.is_empty() {
            return Err(GstatError::Config(
                "at least one percentile is required".to_string(),
            ));
        }
        if let Some(p) = self
            .percentiles
            .iter()
            .find(|p| !p.is_finite() || **p < 0.0 || **p > 100.0)
        {
            return Err(GstatError::Config(format!(
                "percentile {} is outside 0..=100",
                p
            )));
        }
        if self.percentiles.windows(2).any(|w| w[0] >= w[1]) {
            return Err(GstatError::Config(
                "percentiles must be strictly increasing".to_string(),
            ));
        }
        if self.bucket_secs == 0 || self.bucket_secs > MAX_BUCKET_SECS {
            return Err(GstatError::Config(format!(
                "bucket_secs must be between 1 and {}, got {}",
                MAX_BUCKET_SECS, self.bucket_secs
            )));
        }
        if let Some(pattern) = &self.request_filter {
            RequestFilter::from_expr(pattern)?;
        }
        Ok(())
    }

    pub fn request_filter(&self) -> Result<RequestFilter> {
        RequestFilter::from_option(self.request_filter.as_deref())
    }

    pub fn figure_options(&self) -> FigureOptions {
        FigureOptions {
            title: self.title.clone(),
            bucket_secs: self.bucket_secs,
        }
    }
}
