//! The point-value stage: dump in, table and report out.

use std::path::Path;

use tracing::info;

use tpahelper_core::io::write_atomic;
use tpahelper_core::protocol::PointProcessor;
use tpahelper_core::series::{render_report, write_parquet};
use tpahelper_core::{extract_table, PacketDumpReader};

use crate::error::PipelineError;

/// Extract `processor`'s points from `dump`, write `table` and `report`.
///
/// A dump that breaks off part-way still produces a table from the packets
/// before the break. An empty extraction writes an empty table and the
/// no-data report. Only an unreadable dump or a failed write is an error.
pub fn run_point_values<P: PointProcessor + ?Sized>(
    stage: &str,
    processor: &P,
    dump: &Path,
    table: &Path,
    report: &Path,
) -> Result<(), PipelineError> {
    let extraction_error = |source: tpahelper_core::Error| PipelineError::Extraction {
        stage: stage.to_string(),
        source,
    };

    let mut reader = PacketDumpReader::open(dump).map_err(|e| extraction_error(e.into()))?;
    let run = extract_table(&mut reader, processor).map_err(|e| extraction_error(e.into()))?;

    write_parquet(&run.table, table).map_err(extraction_error)?;

    let html = render_report(&run.table, processor.display_name());
    write_atomic(report, html.as_bytes()).map_err(|source| PipelineError::Artifact {
        stage: stage.to_string(),
        path: report.to_path_buf(),
        source,
    })?;

    info!(
        packets = run.extract.packets,
        records = run.extract.records,
        degraded = run.extract.degraded,
        rows = run.table.num_rows(),
        points = run.table.num_columns(),
        truncated = run.truncated.is_some(),
        "point values extracted"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tpahelper_core::protocol::Dnp3Processor;
    use tpahelper_core::series::{no_data_marker, read_parquet};

    #[test]
    fn test_empty_dump_writes_empty_artifacts() {
        let dir = TempDir::new().unwrap();
        let dump = dir.path().join("target_dnp3.json");
        fs::write(&dump, "[]").unwrap();
        let table = dir.path().join("out/dnp3.parquet");
        let report = dir.path().join("out/dnp3.html");

        run_point_values("dnp3_values", &Dnp3Processor, &dump, &table, &report).unwrap();

        assert!(read_parquet(&table).unwrap().is_empty());
        assert_eq!(fs::read_to_string(&report).unwrap(), no_data_marker("DNP3"));
    }

    #[test]
    fn test_missing_dump_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = run_point_values(
            "dnp3_values",
            &Dnp3Processor,
            &dir.path().join("absent.json"),
            &dir.path().join("t.parquet"),
            &dir.path().join("r.html"),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Extraction { ref stage, .. } if stage == "dnp3_values"));
        assert!(!dir.path().join("t.parquet").exists());
    }

    #[test]
    fn test_truncated_dump_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let dump = dir.path().join("target_dnp3.json");
        fs::write(
            &dump,
            r#"[{"_source": {"layers": {
                "frame": {"frame.time": "Jan  1, 2024 00:00:00.100000000 UTC"},
                "dnp3": {"dnp3.al.index": "1", "dnp3.al.ana.int": "10"}
            }}}, {"_sou"#,
        )
        .unwrap();
        let table = dir.path().join("t.parquet");
        let report = dir.path().join("r.html");

        run_point_values("dnp3_values", &Dnp3Processor, &dump, &table, &report).unwrap();

        let read = read_parquet(&table).unwrap();
        assert_eq!(read.num_rows(), 1);
        assert_eq!(read.column("1"), Some(&[10.0][..]));
    }
}
