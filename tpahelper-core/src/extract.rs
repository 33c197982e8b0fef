//! Dump-to-table extraction: packets in, resampled table out.

use std::io::BufRead;

use tracing::{debug, warn};

use crate::error::DumpError;
use crate::io::PacketDumpReader;
use crate::protocol::{ExtractStats, PointProcessor};
use crate::series::{AssembleStats, TimeSeriesAssembler, TimeSeriesTable};

/// Result of one extraction run.
#[derive(Debug)]
pub struct Extraction {
    pub table: TimeSeriesTable,
    pub extract: ExtractStats,
    pub assemble: AssembleStats,
    /// Set when the dump broke off part-way; `table` holds what was read.
    pub truncated: Option<DumpError>,
}

/// Stream every packet of a dump through `processor` and assemble the table.
///
/// A dump that turns malformed part-way is not fatal: the packets before
/// the error are kept and the error is returned in
/// [`Extraction::truncated`]. Only a dump that cannot be read at all is an
/// error.
pub fn extract_table<R, P>(
    reader: &mut PacketDumpReader<R>,
    processor: &P,
) -> Result<Extraction, DumpError>
where
    R: BufRead,
    P: PointProcessor + ?Sized,
{
    let extractor = processor.extractor();
    let mut assembler = TimeSeriesAssembler::new();
    let mut stats = ExtractStats::default();
    let mut points = Vec::new();

    let result = reader.process_packets(|packet| {
        points.clear();
        let outcome = extractor.extract_into(&packet, &mut points);
        stats.add(outcome);
        assembler.extend(&points);
    });

    let truncated = match result {
        Ok(packets) => {
            debug!(protocol = processor.name(), packets, "dump fully read");
            None
        }
        Err(err @ DumpError::Malformed { .. }) => {
            warn!(
                protocol = processor.name(),
                packets = err.packets_read(),
                error = %err,
                "packet dump is malformed, keeping packets read so far"
            );
            Some(err)
        }
        Err(err) => return Err(err),
    };

    if stats.skipped_fields > 0 {
        warn!(
            protocol = processor.name(),
            skipped = stats.skipped_fields,
            "fields skipped on index/value count mismatch"
        );
    }
    let assemble = assembler.stats();
    if assemble.untimed > 0 {
        warn!(
            protocol = processor.name(),
            records = assemble.untimed,
            "records without a parseable frame timestamp were dropped"
        );
    }

    Ok(Extraction {
        table: assembler.finish(),
        extract: stats,
        assemble,
        truncated,
    })
}
