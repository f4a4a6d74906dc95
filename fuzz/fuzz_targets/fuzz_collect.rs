#![no_main]
use std::io::{BufReader, Cursor};

use libfuzzer_sys::fuzz_target;
use newstrends::collect::{ColumnLayout, collect_records};

/// Fuzz the streaming collector with arbitrary byte streams: header
/// detection, column fetching, and row error recovery must never panic.
fuzz_target!(|data: &[u8]| {
    let reader = BufReader::new(Cursor::new(data.to_vec()));
    let _ = collect_records(reader, ColumnLayout::default());
});
