//! Command-line interface module.
//!
//! This module handles:
//! - Argument parsing via clap
//! - Output formatting of point-value tables (table, CSV, JSON)
//! - Export of point-value tables (Parquet, JSON, CSV files)

mod args;
mod export;
mod output;

pub use args::{Args, Commands, ExportFormat};
pub use export::Exporter;
pub use output::{OutputFormat, OutputFormatter};
