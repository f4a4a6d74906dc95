#![no_main]
use libfuzzer_sys::fuzz_target;
use newstrends::http::trends::parse_window;

/// Fuzz the query-string window grammar; unknown input must fall back to
/// the 7-day default without panicking.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = parse_window(s);
    }
});
