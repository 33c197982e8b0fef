//! Point-value time series.
//!
//! [`TimeSeriesAssembler`] turns the flat stream of [`PointValue`]s from one
//! extraction run into a [`TimeSeriesTable`]: one row per time bucket, one
//! column per point index, each cell the mean of the samples that fell into
//! the bucket.
//!
//! ```rust
//! use tpahelper_core::protocol::PointValue;
//! use tpahelper_core::series::TimeSeriesAssembler;
//!
//! let point = |time: &str, value: &str| PointValue {
//!     kind: "dnp3.al.ana.int".into(),
//!     frame_time: Some(time.into()),
//!     frame_time_utc: None,
//!     fine_time: None,
//!     index: "1".into(),
//!     value: value.into(),
//! };
//!
//! let table = TimeSeriesAssembler::assemble(&[
//!     point("2024-01-01T00:00:00.000Z", "5.0"),
//!     point("2024-01-01T00:00:00.900Z", "7.0"),
//! ]);
//! assert_eq!(table.num_rows(), 1);
//! assert_eq!(table.column("1"), Some(&[6.0][..]));
//! ```

mod persist;
mod report;
mod time;

pub use persist::{read_parquet, write_parquet};
pub use report::{no_data_marker, render_report};
pub use time::{parse_frame_time, record_time};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, RecordBatch, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use compact_str::CompactString;
use tracing::debug;

use crate::error::TableError;
use crate::protocol::{PointValue, FRAME_TIME};

/// Default resampling bucket: one second.
pub const DEFAULT_BUCKET_MICROS: i64 = 1_000_000;

/// Name of the time column.
pub const TIME_COLUMN: &str = FRAME_TIME;

/// Running sum and count for one (index, bucket) cell.
#[derive(Debug, Clone, Copy, Default)]
struct Mean {
    sum: f64,
    count: u64,
}

impl Mean {
    fn value(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Records that could not be placed in the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssembleStats {
    /// Records pushed.
    pub records: u64,
    /// Records with no parseable frame timestamp.
    pub untimed: u64,
    /// Records whose value is not numeric.
    pub non_numeric: u64,
}

/// Resample-and-pivot accumulator.
///
/// Records can be pushed in any order; grouping is by point index and
/// bucket start, so the result does not depend on arrival order.
#[derive(Debug, Clone)]
pub struct TimeSeriesAssembler {
    bucket_micros: i64,
    groups: BTreeMap<CompactString, BTreeMap<i64, Mean>>,
    stats: AssembleStats,
}

impl Default for TimeSeriesAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSeriesAssembler {
    /// Assembler with one-second buckets.
    pub fn new() -> Self {
        Self::with_bucket_micros(DEFAULT_BUCKET_MICROS)
    }

    /// Assembler with a custom bucket width. Widths below 1µs are clamped.
    pub fn with_bucket_micros(bucket_micros: i64) -> Self {
        Self {
            bucket_micros: bucket_micros.max(1),
            groups: BTreeMap::new(),
            stats: AssembleStats::default(),
        }
    }

    /// One-shot assembly of a slice of records.
    pub fn assemble(points: &[PointValue]) -> TimeSeriesTable {
        let mut assembler = Self::new();
        assembler.extend(points);
        assembler.finish()
    }

    /// Add one record.
    pub fn push(&mut self, point: &PointValue) {
        self.stats.records += 1;

        let Some(time) = record_time(point) else {
            self.stats.untimed += 1;
            debug!(index = %point.index, "record has no usable frame timestamp");
            return;
        };
        let Some(value) = point.numeric_value() else {
            self.stats.non_numeric += 1;
            return;
        };

        let Some(bucket) = time
            .div_euclid(self.bucket_micros)
            .checked_mul(self.bucket_micros)
        else {
            self.stats.untimed += 1;
            debug!(index = %point.index, time, "frame timestamp outside the bucket range");
            return;
        };
        let cell = self
            .groups
            .entry(point.index.clone())
            .or_default()
            .entry(bucket)
            .or_default();
        cell.sum += value;
        cell.count += 1;
    }

    /// Add many records.
    pub fn extend<'a, I>(&mut self, points: I)
    where
        I: IntoIterator<Item = &'a PointValue>,
    {
        for point in points {
            self.push(point);
        }
    }

    /// Counters so far.
    pub fn stats(&self) -> AssembleStats {
        self.stats
    }

    /// Pivot the buckets into a dense table.
    ///
    /// Rows are the union of every index's non-empty buckets, ascending.
    /// A cell with no samples is 0.0.
    pub fn finish(self) -> TimeSeriesTable {
        let times: Vec<i64> = self
            .groups
            .values()
            .flat_map(|buckets| buckets.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut columns: Vec<(CompactString, Vec<f64>)> = self
            .groups
            .into_iter()
            .map(|(index, buckets)| {
                let cells = times
                    .iter()
                    .map(|t| buckets.get(t).map_or(0.0, Mean::value))
                    .collect();
                (index, cells)
            })
            .collect();
        sort_columns(&mut columns);

        TimeSeriesTable {
            bucket_micros: self.bucket_micros,
            times,
            columns,
        }
    }
}

/// Numeric order when every index is an integer, lexicographic otherwise.
///
/// Columns arrive in lexicographic order from the B-tree.
fn sort_columns(columns: &mut [(CompactString, Vec<f64>)]) {
    let numeric = |k: &CompactString| k.trim().parse::<i64>().ok();
    if columns.iter().all(|(k, _)| numeric(k).is_some()) {
        columns.sort_by_cached_key(|(k, _)| numeric(k));
    }
}

/// Dense time × point-index table.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable {
    bucket_micros: i64,
    times: Vec<i64>,
    columns: Vec<(CompactString, Vec<f64>)>,
}

impl TimeSeriesTable {
    /// Zero-row table with no point columns.
    pub fn empty() -> Self {
        Self {
            bucket_micros: DEFAULT_BUCKET_MICROS,
            times: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.times.len()
    }

    /// Point-index columns, not counting the time column.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn bucket_micros(&self) -> i64 {
        self.bucket_micros
    }

    /// Bucket starts, microseconds since the epoch, ascending.
    pub fn times(&self) -> &[i64] {
        &self.times
    }

    /// Point indices in column order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(k, _)| k.as_str())
    }

    /// Cells of one point index.
    pub fn column(&self, index: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(k, _)| k == index)
            .map(|(_, v)| v.as_slice())
    }

    /// Arrow schema: `frame.time` then one Float64 per point index.
    ///
    /// Times carry no zone annotation; they are always UTC.
    pub fn schema(&self) -> SchemaRef {
        let mut fields = Vec::with_capacity(self.columns.len() + 1);
        fields.push(Field::new(
            TIME_COLUMN,
            DataType::Timestamp(TimeUnit::Microsecond, None),
            false,
        ));
        for (name, _) in &self.columns {
            fields.push(Field::new(name.as_str(), DataType::Float64, false));
        }
        Arc::new(Schema::new(fields))
    }

    /// The table as one record batch.
    pub fn to_record_batch(&self) -> Result<RecordBatch, TableError> {
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(self.columns.len() + 1);
        arrays.push(Arc::new(TimestampMicrosecondArray::from(self.times.clone())));
        for (_, cells) in &self.columns {
            arrays.push(Arc::new(Float64Array::from(cells.clone())));
        }
        Ok(RecordBatch::try_new(self.schema(), arrays)?)
    }

    /// Rebuild a table from a batch with this table's schema.
    pub fn from_record_batches(batches: &[RecordBatch]) -> Result<Self, TableError> {
        let Some(first) = batches.first() else {
            return Ok(Self::empty());
        };
        let schema = first.schema();

        let mut times = Vec::new();
        let mut columns: Vec<(CompactString, Vec<f64>)> = schema
            .fields()
            .iter()
            .skip(1)
            .map(|f| (CompactString::new(f.name()), Vec::new()))
            .collect();

        for batch in batches {
            let time = batch
                .column(0)
                .as_any()
                .downcast_ref::<TimestampMicrosecondArray>()
                .ok_or_else(|| TableError::Arrow(format!("column 0 is not {TIME_COLUMN}")))?;
            times.extend(time.values().iter().copied());

            for (i, (name, cells)) in columns.iter_mut().enumerate() {
                let values = batch
                    .column(i + 1)
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .ok_or_else(|| TableError::Arrow(format!("column {name} is not Float64")))?;
                cells.extend(values.values().iter().copied());
            }
        }

        Ok(Self {
            bucket_micros: DEFAULT_BUCKET_MICROS,
            times,
            columns,
        })
    }
}
