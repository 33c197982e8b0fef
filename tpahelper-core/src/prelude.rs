//! Convenient re-exports for common usage.
//!
//! ```rust
//! use tpahelper_core::prelude::*;
//!
//! let registry = default_registry();
//! assert!(registry.get("dnp3").is_some());
//! ```

// Tree types
pub use crate::tree::{Node, TreeMatcher};

// Protocol types
pub use crate::protocol::{default_registry, PointProcessor, PointValue, ProcessorRegistry};

// I/O types
pub use crate::io::PacketDumpReader;

// Series types
pub use crate::extract::extract_table;
pub use crate::series::{read_parquet, write_parquet, TimeSeriesAssembler, TimeSeriesTable};

// Error types
pub use crate::error::{Error, Result};
