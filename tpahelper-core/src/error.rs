//! Error types for tpahelper-core.
//!
//! This module provides structured error types for all tpahelper-core operations:
//!
//! - [`enum@Error`] - Main error enum that wraps all error types
//! - [`DumpError`] - Errors from reading decoded packet dumps
//! - [`PatternError`] - Errors from compiling tree path patterns
//! - [`TableError`] - Errors from building or persisting point-value tables
//!
//! All errors implement `std::error::Error` and can be converted to `anyhow::Error`.

use thiserror::Error;

/// Main error type for tpahelper-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Error reading a decoded packet dump
    #[error("Packet dump error: {0}")]
    Dump(#[from] DumpError),

    /// Invalid path pattern
    #[error("Path pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// Error building or writing a table
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to decoded packet dumps.
#[derive(Error, Debug)]
pub enum DumpError {
    /// The dump could not be opened or read at all
    #[error("Cannot read packet dump {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The dump stopped being valid JSON part-way through
    #[error("Malformed packet dump after {packets} packets: {reason}")]
    Malformed { packets: u64, reason: String },
}

impl DumpError {
    /// Number of packets delivered before the error, if any were.
    pub fn packets_read(&self) -> u64 {
        match self {
            DumpError::Unreadable { .. } => 0,
            DumpError::Malformed { packets, .. } => *packets,
        }
    }
}

/// Errors related to path pattern compilation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Pattern has no segments
    #[error("empty path pattern")]
    Empty,

    /// Pattern contains `//` or a leading/trailing separator
    #[error("empty segment at position {position} in pattern '{pattern}'")]
    EmptySegment { pattern: String, position: usize },
}

/// Errors related to point-value tables.
#[derive(Error, Debug)]
pub enum TableError {
    /// Arrow error while building record batches
    #[error("Arrow error: {0}")]
    Arrow(String),

    /// Parquet error while writing or reading a table
    #[error("Parquet error: {0}")]
    Parquet(String),
}

impl From<arrow::error::ArrowError> for TableError {
    fn from(err: arrow::error::ArrowError) -> Self {
        TableError::Arrow(err.to_string())
    }
}

impl From<parquet::errors::ParquetError> for TableError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        TableError::Parquet(err.to_string())
    }
}

impl From<arrow::error::ArrowError> for Error {
    fn from(err: arrow::error::ArrowError) -> Self {
        Error::Table(TableError::from(err))
    }
}

impl From<parquet::errors::ParquetError> for Error {
    fn from(err: parquet::errors::ParquetError) -> Self {
        Error::Table(TableError::from(err))
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
