//! tpahelper - run a packet-capture extraction pipeline and track its progress.
//!
//! Each capture gets its own output directory. A fixed catalogue of stages
//! runs external tools against the capture (capture statistics, protocol
//! hierarchy, DPI summary, string extraction, per-protocol filtering and
//! decoding) and then turns each protocol's decoded packets into a
//! point-value time series. Progress is recorded in marker files so a
//! finished capture is never reprocessed.
//!
//! The extraction side lives in [`tpahelper_core`]; this crate adds the
//! orchestration, status tracking and CLI.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tpahelper::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let stages = default_stages(&default_registry())?;
//!     let orchestrator = PipelineOrchestrator::new(Config::from_env(), stages, Arc::new(ProcessRunner));
//!
//!     let captures = vec![Capture::new("plant1.pcap"), Capture::new("plant2.pcap")];
//!     for (capture, result) in orchestrator.run_many(captures, 2).await {
//!         println!("{}: {:?}", capture.name(), result.map(|o| o.status()));
//!     }
//!     Ok(())
//! }
//! ```

pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod status;
pub mod tool;

pub use error::{Error, Result};

/// Commonly used types.
pub mod prelude {
    pub use crate::capture::Capture;
    pub use crate::config::Config;
    pub use crate::error::{Error, PipelineError, Result, StatusError};
    pub use crate::pipeline::{default_stages, PipelineOrchestrator, RunOutcome, StageRegistry};
    pub use crate::status::{StatusTracker, TaskStatus};
    pub use crate::tool::{ProcessRunner, ToolRunner};
    pub use tpahelper_core::protocol::default_registry;
}
