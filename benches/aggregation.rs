//! Log ingestion benchmark
//!
//! Parses an in-memory simulation log and aggregates it into a run, then
//! computes statistics for every request.
//!
//! ```bash
//! cargo bench --bench aggregation
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gstat::discovery::read_run;
use gstat::filter::RequestFilter;
use gstat::record::RecordReader;
use gstat::stats::{Statistics, DEFAULT_PERCENTILES};
use std::fmt::Write;

fn create_bench_log(rows: usize) -> String {
    let mut log = String::from(
        "record_type,scenario_name,group_hierarchy,request_name,status,start_timestamp,end_timestamp,response_time_ms,message\n",
    );
    for i in 0..rows {
        let start = 1_700_000_000_000u64 + i as u64 * 10;
        let rt = (i * 37 % 900) as u64;
        let _ = writeln!(
            log,
            "request,Bench,Checkout|Step {},request_{},OK,{},{},{},",
            i % 5,
            i % 20,
            start,
            start + rt,
            rt
        );
    }
    log
}

fn bench_read_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_run");

    for rows in [1_000, 10_000, 100_000] {
        let log = create_bench_log(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &log, |b, log| {
            b.iter(|| {
                let reader = RecordReader::new(log.as_bytes(), "bench.csv");
                read_run(reader, "bench-1", &DEFAULT_PERCENTILES, &RequestFilter::all())
            });
        });
    }

    group.finish();
}

fn bench_statistics(c: &mut Criterion) {
    let values: Vec<u64> = (0..100_000u64).map(|i| i * 7919 % 10_000).collect();

    c.bench_function("statistics_compute_100k", |b| {
        b.iter(|| Statistics::compute(black_box(&values), &DEFAULT_PERCENTILES));
    });
}

criterion_group!(benches, bench_read_run, bench_statistics);
criterion_main!(benches);
