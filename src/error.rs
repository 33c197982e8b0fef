//! Error types for tpahelper.

use std::path::PathBuf;

use thiserror::Error;

use crate::status::TaskStatus;

/// Main error type for tpahelper operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from extraction or table persistence
    #[error(transparent)]
    Core(#[from] tpahelper_core::Error),

    /// Error while resolving or running pipeline stages
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Error reading or writing status markers
    #[error("Status error: {0}")]
    Status(#[from] StatusError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to stage resolution and execution.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// External tool ran but exited unsuccessfully
    #[error("{stage}: {tool} exited with {}: {stderr}", exit_label(.code))]
    ExternalTool {
        stage: String,
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    /// External tool could not be started
    #[error("{stage}: failed to start {tool}: {source}")]
    Spawn {
        stage: String,
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// Extraction could not read its input or write its output
    #[error("{stage}: {source}")]
    Extraction {
        stage: String,
        #[source]
        source: tpahelper_core::Error,
    },

    /// A stage finished but one of its declared artifacts is missing
    #[error("{stage}: declared artifact {} was not produced", .path.display())]
    MissingArtifact { stage: String, path: PathBuf },

    /// A stage artifact or its directory could not be written
    #[error("{stage}: cannot write {}: {source}", .path.display())]
    Artifact {
        stage: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stage name not registered
    #[error("Unknown stage: {name}")]
    UnknownStage { name: String },

    /// A stage depends on a stage that is not registered
    #[error("Stage {stage} depends on unknown stage {dependency}")]
    UnknownDependency { stage: String, dependency: String },

    /// Two stages registered under one name
    #[error("Duplicate stage: {name}")]
    DuplicateStage { name: String },

    /// Dependency graph has a cycle through these stages
    #[error("Dependency cycle among stages: {}", .stages.join(", "))]
    Cycle { stages: Vec<String> },

    /// A capture worker panicked or was cancelled
    #[error("Worker failed: {0}")]
    Join(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (killed by signal)".to_string(),
    }
}

/// Errors related to per-capture status tracking.
#[derive(Error, Debug)]
pub enum StatusError {
    /// Another run holds the capture
    #[error("Capture {capture} is already running")]
    AlreadyRunning { capture: String },

    /// Requested transition would move backward or out of a terminal state
    #[error("Capture {capture}: cannot move from {from} to {to}")]
    InvalidTransition {
        capture: String,
        from: TaskStatus,
        to: TaskStatus,
    },

    /// Marker file could not be written
    #[error("Cannot write status marker {}: {source}", .path.display())]
    Marker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
