//! Export of point-value tables to files.

use std::io::{self, Write};
use std::path::Path;

use arrow::array::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use tpahelper_core::io::write_atomic_with;

use super::output::{write_csv, write_json};
use super::ExportFormat;

/// Exports record batches to Parquet, JSON lines or CSV files.
pub struct Exporter;

impl Exporter {
    /// Export `batches` to `path`; returns the number of rows written.
    ///
    /// The file only appears once it is complete. Nothing is written for an
    /// empty slice.
    pub fn export<P: AsRef<Path>>(
        path: P,
        format: ExportFormat,
        batches: &[RecordBatch],
    ) -> io::Result<usize> {
        let Some(first) = batches.first() else {
            return Ok(0);
        };
        let rows = batches.iter().map(|b| b.num_rows()).sum();

        write_atomic_with(path.as_ref(), |w| -> io::Result<()> {
            match format {
                ExportFormat::Parquet => {
                    let props = WriterProperties::builder()
                        .set_compression(Compression::SNAPPY)
                        .build();
                    let mut writer = ArrowWriter::try_new(&mut *w, first.schema(), Some(props))
                        .map_err(io::Error::other)?;
                    for batch in batches {
                        writer.write(batch).map_err(io::Error::other)?;
                    }
                    writer.close().map_err(io::Error::other)?;
                }
                ExportFormat::Json => {
                    for batch in batches {
                        write_json(batch, w)?;
                    }
                }
                ExportFormat::Csv => {
                    for (i, batch) in batches.iter().enumerate() {
                        write_csv(batch, w, i == 0)?;
                    }
                }
            }
            w.flush()
        })?;

        Ok(rows)
    }
}
