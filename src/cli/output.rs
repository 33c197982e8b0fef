//! Output formatting for point-value tables.
//!
//! Writes a `RecordBatch` as a pretty table, CSV, or JSON lines. Cells are
//! rendered with Arrow's display formatting, so the time column prints as
//! an ISO 8601 timestamp and point values as plain floats.

use std::io::Write;

use arrow::array::{Array, ArrayRef, RecordBatch};
use clap::ValueEnum;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table (default)
    Table,
    /// Comma-separated values
    Csv,
    /// JSON Lines (one JSON object per row)
    Json,
}

/// Formats point-value tables for output.
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Format a RecordBatch and write to the given writer.
    pub fn write<W: Write>(&self, batch: &RecordBatch, writer: &mut W) -> std::io::Result<()> {
        match self.format {
            OutputFormat::Table => write_table(batch, writer),
            OutputFormat::Csv => write_csv(batch, writer, true),
            OutputFormat::Json => write_json(batch, writer),
        }
    }
}

/// Display text of one cell; empty for nulls.
pub(crate) fn cell_text(col: &ArrayRef, row: usize) -> String {
    if col.is_null(row) {
        return String::new();
    }
    arrow::util::display::array_value_to_string(col, row).unwrap_or_else(|_| "?".to_string())
}

/// JSON value of one cell, keeping numbers numeric.
pub(crate) fn cell_json(col: &ArrayRef, row: usize) -> serde_json::Value {
    if col.is_null(row) {
        return serde_json::Value::Null;
    }
    let text = cell_text(col, row);
    let number = if col.data_type().is_floating() {
        text.parse::<f64>().ok().and_then(serde_json::Number::from_f64)
    } else if col.data_type().is_integer() {
        text.parse::<i64>().ok().map(serde_json::Number::from)
    } else {
        None
    };
    number.map_or(serde_json::Value::String(text), serde_json::Value::Number)
}

fn csv_field(value: String) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value
    }
}

fn write_table<W: Write>(batch: &RecordBatch, writer: &mut W) -> std::io::Result<()> {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(batch.schema().fields().iter().map(|f| Cell::new(f.name())));

    for row in 0..batch.num_rows() {
        table.add_row(batch.columns().iter().map(|col| Cell::new(cell_text(col, row))));
    }

    writeln!(writer, "{table}")
}

pub(crate) fn write_csv<W: Write>(
    batch: &RecordBatch,
    writer: &mut W,
    header: bool,
) -> std::io::Result<()> {
    if header {
        let schema = batch.schema();
        let names: Vec<String> = schema
            .fields()
            .iter()
            .map(|f| csv_field(f.name().clone()))
            .collect();
        writeln!(writer, "{}", names.join(","))?;
    }

    for row in 0..batch.num_rows() {
        let values: Vec<String> = batch
            .columns()
            .iter()
            .map(|col| csv_field(cell_text(col, row)))
            .collect();
        writeln!(writer, "{}", values.join(","))?;
    }
    Ok(())
}

pub(crate) fn write_json<W: Write>(batch: &RecordBatch, writer: &mut W) -> std::io::Result<()> {
    let schema = batch.schema();
    for row in 0..batch.num_rows() {
        let obj: serde_json::Map<String, serde_json::Value> = schema
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, col)| (field.name().clone(), cell_json(col, row)))
            .collect();
        writeln!(writer, "{}", serde_json::Value::Object(obj))?;
    }
    Ok(())
}
