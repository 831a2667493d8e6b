#![no_main]

use gstat::filter::RequestFilter;
use gstat::identity::FullRequestPath;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing must not panic; a valid filter must accept any path
        if let Ok(filter) = RequestFilter::from_expr(input) {
            let _ = filter.matches(&FullRequestPath::resolve(&["Group"], input));
        }
    }
});
