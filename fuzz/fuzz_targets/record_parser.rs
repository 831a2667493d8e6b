#![no_main]

use gstat::discovery::read_run;
use gstat::filter::RequestFilter;
use gstat::record::RecordReader;
use gstat::stats::DEFAULT_PERCENTILES;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes as a simulation log: every row must either parse or
    // produce an error, never panic
    let reader = RecordReader::new(data, "fuzz.csv");
    if let Ok(run) = read_run(reader, "fuzz-1", &DEFAULT_PERCENTILES, &RequestFilter::all()) {
        for aggregate in run.requests() {
            let _ = aggregate.statistics();
        }
    }
});
