//! Stage catalogue and orchestration.
//!
//! A pipeline is a [`StageRegistry`]: named [`Stage`]s, each declaring the
//! stages it depends on, the artifacts it leaves in the capture's output
//! directory, and what it runs. [`PipelineOrchestrator`] resolves the
//! registry into a dependency order once per run and executes the stages
//! one at a time, wrapping the run in the capture's status lifecycle.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tpahelper::capture::Capture;
//! use tpahelper::config::Config;
//! use tpahelper::pipeline::{default_stages, PipelineOrchestrator};
//! use tpahelper::tool::ProcessRunner;
//! use tpahelper_core::protocol::default_registry;
//!
//! let stages = default_stages(&default_registry())?;
//! let orchestrator = PipelineOrchestrator::new(Config::from_env(), stages, Arc::new(ProcessRunner));
//! let outcome = orchestrator.run(&Capture::new("plant1.pcap"))?;
//! println!("{:?}", outcome);
//! # Ok::<(), tpahelper::Error>(())
//! ```

mod extract;
mod orchestrator;
mod registry;
mod stage;
pub mod stages;

pub use extract::run_point_values;
pub use orchestrator::{ArtifactInfo, PipelineOrchestrator, RunOutcome};
pub use registry::StageRegistry;
pub use stage::{Arg, Stage, StageAction, ToolSpec};
pub use stages::default_stages;
