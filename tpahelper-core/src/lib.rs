//! # tpahelper-core
//!
//! Protocol point-value extraction from decoded packet dumps.
//!
//! This crate holds the data side of tpahelper, without any pipeline or
//! process-management code. It can be used standalone to turn a packet
//! decoder's JSON dump into a regularly-sampled point-value table.
//!
//! ## Features
//!
//! - **Tree Search**: wildcard path matching over nested packet records,
//!   deterministic pre-order results, duplicate keys preserved
//! - **Dump Reading**: streaming reader for JSON-array and JSON-lines dumps
//! - **Point Processors**: per-protocol field layout (DNP3 built in) with a
//!   degrade-not-drop fallback for packets missing the fine timestamp
//! - **Time Series**: 1-second mean resampling, pivot to a dense grid,
//!   Parquet output and an HTML companion report
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tpahelper_core::prelude::*;
//!
//! let registry = default_registry();
//! let dnp3 = registry.get("dnp3").unwrap();
//!
//! let mut reader = PacketDumpReader::open("target_dnp3.json").unwrap();
//! let run = extract_table(&mut reader, dnp3).unwrap();
//!
//! write_parquet(&run.table, "dnp3_point_values.parquet".as_ref()).unwrap();
//! println!("{} rows x {} points", run.table.num_rows(), run.table.num_columns());
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                        tpahelper-core                               |
//! +---------------------------------------------------------------------+
//! |  tree/       - Node, PathPattern, TreeMatcher                       |
//! |  io/         - PacketDumpReader, atomic file writes                 |
//! |  protocol/   - PointProcessor trait, DNP3, PointExtractor, registry |
//! |  series/     - TimeSeriesAssembler, table, Parquet, HTML report     |
//! |  extract     - dump -> table in one pass                            |
//! |  error/      - Error types                                          |
//! +---------------------------------------------------------------------+
//! ```

pub mod error;
pub mod extract;
pub mod io;
pub mod prelude;
pub mod protocol;
pub mod series;
pub mod tree;

// Re-export commonly used types at crate root for convenience
pub use error::{DumpError, Error, PatternError, Result, TableError};
pub use extract::{extract_table, Extraction};
pub use io::{write_atomic, write_atomic_with, DumpLayout, PacketDumpReader};
pub use protocol::{
    default_registry, BuiltinProcessor, Dnp3Processor, ExtractStats, PacketOutcome,
    PointExtractor, PointProcessor, PointValue, ProcessorRegistry,
};
pub use series::{
    read_parquet, render_report, write_parquet, AssembleStats, TimeSeriesAssembler,
    TimeSeriesTable,
};
pub use tree::{Match, MatchPath, Node, PathPattern, TreeMatcher};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
