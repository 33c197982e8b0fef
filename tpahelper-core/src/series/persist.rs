//! Parquet persistence for point-value tables.

use std::fs::File;
use std::path::Path;

use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tracing::debug;

use super::TimeSeriesTable;
use crate::error::{Error, Result, TableError};
use crate::io::write_atomic_with;

/// Write `table` to `path` as Snappy-compressed Parquet.
///
/// The file appears under its final name only once complete. An empty
/// table still produces a valid file carrying the time column.
pub fn write_parquet(table: &TimeSeriesTable, path: &Path) -> Result<()> {
    let batch = table.to_record_batch()?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    write_atomic_with(path, |out| -> Result<()> {
        let mut writer = ArrowWriter::try_new(out, batch.schema(), Some(props))
            .map_err(TableError::from)?;
        writer.write(&batch).map_err(TableError::from)?;
        writer.close().map_err(TableError::from)?;
        Ok(())
    })?;

    debug!(
        path = %path.display(),
        rows = table.num_rows(),
        columns = table.num_columns(),
        "wrote point-value table"
    );
    Ok(())
}

/// Read a table written by [`write_parquet`].
pub fn read_parquet(path: &Path) -> Result<TimeSeriesTable> {
    let file = File::open(path).map_err(Error::Io)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(TableError::from)?
        .build()
        .map_err(TableError::from)?;

    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(TableError::from)?;

    if batches.is_empty() {
        return Ok(TimeSeriesTable::empty());
    }
    Ok(TimeSeriesTable::from_record_batches(&batches)?)
}
