//! Fuzz target for decoded packet dump extraction.
//!
//! Feeds arbitrary bytes through the dump reader, the DNP3 extractor and
//! the time-series assembler. Malformed dumps must come back as errors or a
//! truncated extraction, never a panic.

#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use tpahelper_core::{extract_table, Dnp3Processor, PacketDumpReader};

fuzz_target!(|data: &[u8]| {
    let mut reader = PacketDumpReader::new(Cursor::new(data));
    if let Ok(run) = extract_table(&mut reader, &Dnp3Processor) {
        let rows = run.table.num_rows();
        for name in run.table.column_names() {
            assert_eq!(run.table.column(name).map(<[f64]>::len), Some(rows));
        }
        let _ = run.table.to_record_batch();
    }
});
