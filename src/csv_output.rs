//! CSV output format for aggregated statistics
//!
//! One row per (simulation, run, request) for spreadsheet analysis.

use crate::stats::percentile_label;
use crate::store::AggregateStore;
use std::io::Write;

/// CSV statistics formatter
#[derive(Debug)]
pub struct CsvStatsOutput<'a> {
    store: &'a AggregateStore,
}

impl<'a> CsvStatsOutput<'a> {
    pub fn new(store: &'a AggregateStore) -> Self {
        Self { store }
    }

    fn header(&self) -> Vec<String> {
        let mut headers: Vec<String> = [
            "simulation",
            "run",
            "request",
            "count",
            "ko",
            "mean_ms",
            "stddev_ms",
            "min_ms",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        headers.extend(
            self.store
                .percentiles()
                .iter()
                .map(|p| format!("{}_ms", percentile_label(*p))),
        );
        headers
    }

    /// Write all rows, header first
    pub fn write_to<W: Write>(&self, output: W) -> csv::Result<()> {
        let mut writer = csv::Writer::from_writer(output);
        writer.write_record(self.header())?;

        for simulation in self.store.simulations() {
            for run in simulation.runs() {
                for aggregate in run.requests() {
                    let stats = aggregate.statistics();
                    let mut row = vec![
                        simulation.id().to_string(),
                        run.id().to_string(),
                        aggregate.path().to_string(),
                        stats.count.to_string(),
                        aggregate.ko_count().to_string(),
                        format!("{:.3}", stats.mean),
                        format!("{:.3}", stats.stddev),
                        format!("{:.3}", stats.min),
                    ];
                    row.extend(
                        stats
                            .percentiles
                            .iter()
                            .map(|pv| format!("{:.3}", pv.value)),
                    );
                    writer.write_record(&row)?;
                }
            }
        }

        writer.flush()?;
        Ok(())
    }

    pub fn to_csv(&self) -> csv::Result<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
