//! Response-time statistics
//!
//! Count, mean, spread and percentiles over a sequence of observations in
//! milliseconds. Empty input never fails: every derived value is the sentinel
//! `0.0` and `count` is `0`, so callers can tell "no data" from a real zero
//! only through `count`.

use serde::Serialize;

/// Percentiles charted and reported unless configured otherwise. 100 is the
/// maximum.
pub const DEFAULT_PERCENTILES: [f64; 5] = [50.0, 75.0, 95.0, 99.0, 100.0];

/// One percentile value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentileValue {
    pub percentile: f64,
    pub value: f64,
}

/// Summary statistics for a set of observations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub count: usize,
    pub mean: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
    pub percentiles: Vec<PercentileValue>,
}

impl Statistics {
    /// Compute statistics over `observations`. The slice is not reordered;
    /// percentiles are taken from a sorted copy.
    pub fn compute(observations: &[u64], percentiles: &[f64]) -> Self {
        let mut sorted = observations.to_vec();
        sorted.sort_unstable();

        Self {
            count: observations.len(),
            mean: mean(observations),
            stddev: stddev(observations),
            min: sorted.first().map_or(0.0, |&v| v as f64),
            max: sorted.last().map_or(0.0, |&v| v as f64),
            percentiles: percentiles
                .iter()
                .map(|&p| PercentileValue {
                    percentile: p,
                    value: percentile_of_sorted(&sorted, p),
                })
                .collect(),
        }
    }

    /// Value for percentile `p`, if it was requested
    pub fn percentile(&self, p: f64) -> Option<f64> {
        self.percentiles
            .iter()
            .find(|pv| pv.percentile == p)
            .map(|pv| pv.value)
    }
}

/// Arithmetic mean, `0.0` for empty input
pub fn mean(observations: &[u64]) -> f64 {
    if observations.is_empty() {
        return 0.0;
    }
    let total: u128 = observations.iter().map(|&v| v as u128).sum();
    total as f64 / observations.len() as f64
}

/// Population standard deviation, `0.0` for empty input
pub fn stddev(observations: &[u64]) -> f64 {
    if observations.is_empty() {
        return 0.0;
    }
    let m = mean(observations);
    let variance = observations
        .iter()
        .map(|&v| {
            let d = v as f64 - m;
            d * d
        })
        .sum::<f64>()
        / observations.len() as f64;
    variance.sqrt()
}

/// Percentile by linear interpolation between closest ranks on sorted data
pub fn percentile_of_sorted(sorted_data: &[u64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }
    if sorted_data.len() == 1 {
        return sorted_data[0] as f64;
    }

    let p = percentile.clamp(0.0, 100.0);
    let index = (p / 100.0) * (sorted_data.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted_data[lower] as f64
    } else {
        let weight = index - lower as f64;
        sorted_data[lower] as f64 * (1.0 - weight) + sorted_data[upper] as f64 * weight
    }
}

/// Short label for a percentile, e.g. `p95` or `p99.9`
pub fn percentile_label(p: f64) -> String {
    if p == 100.0 {
        "max".to_string()
    } else if p.fract() == 0.0 {
        format!("p{}", p as u64)
    } else {
        format!("p{}", p)
    }
}
