//! Plain-text summary tables
//!
//! One table per run, requests in store order.

use crate::stats::percentile_label;
use crate::store::AggregateStore;
use std::fmt::Write;

/// Render the summary for every run
pub fn render_summary(store: &AggregateStore) -> String {
    let mut out = String::new();
    if store.is_empty() {
        out.push_str("No requests recorded.\n");
        return out;
    }

    let width = store
        .simulations()
        .iter()
        .flat_map(|s| s.runs())
        .flat_map(|r| r.requests())
        .map(|a| a.path().to_string().chars().count())
        .max()
        .unwrap_or(0)
        .max("request".len());

    for simulation in store.simulations() {
        for run in simulation.runs() {
            let summary = run.summary();
            let _ = writeln!(
                out,
                "=== {} / {} ({} users, {} requests, {} KO) ===",
                simulation.id(),
                run.id(),
                summary.users_started,
                summary.requests,
                summary.ko_requests
            );

            let _ = write!(
                out,
                "{:<width$} {:>9} {:>6} {:>10}",
                "request", "count", "ko", "mean"
            );
            for p in store.percentiles() {
                let _ = write!(out, " {:>10}", percentile_label(*p));
            }
            out.push('\n');

            for aggregate in run.requests() {
                let stats = aggregate.statistics();
                let _ = write!(
                    out,
                    "{:<width$} {:>9} {:>6} {:>10.1}",
                    aggregate.path().to_string(),
                    stats.count,
                    aggregate.ko_count(),
                    stats.mean
                );
                for pv in &stats.percentiles {
                    let _ = write!(out, " {:>10.1}", pv.value);
                }
                out.push('\n');
            }
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{LogRecord, RequestEvent, Status};
    use crate::store::StoreBuilder;

    #[test]
    fn test_summary_lists_requests_in_order() {
        let mut builder = StoreBuilder::default();
        for (hierarchy, rt) in [(vec!["B"], 5u64), (vec!["A"], 7)] {
            builder.ingest(
                "sim",
                "sim-1",
                &LogRecord::Request(RequestEvent {
                    scenario_name: "Basic".to_string(),
                    group_hierarchy: hierarchy.iter().map(|s| s.to_string()).collect(),
                    request_name: "X".to_string(),
                    status: Status::Ok,
                    start_timestamp_ms: 0,
                    end_timestamp_ms: rt,
                    response_time_ms: rt,
                    message: None,
                }),
            );
        }
        let text = render_summary(&builder.build());
        assert!(text.contains("=== sim / sim-1"));
        assert!(text.contains("p95"));
        let b = text.find("B|X").unwrap();
        let a = text.find("A|X").unwrap();
        assert!(b < a);
    }

    #[test]
    fn test_empty_store() {
        let store = StoreBuilder::default().build();
        assert_eq!(render_summary(&store), "No requests recorded.\n");
    }
}
