//! Per-capture run status, persisted as marker files.
//!
//! A capture's state is derived from which markers exist in its output
//! directory, with precedence Done > Failed > Running > New:
//!
//! | Marker | State |
//! |--------|-------|
//! | `all_tasks_complete.txt` | Done |
//! | `did_not_complete.txt` | Failed |
//! | `task_created.txt` | Running |
//! | none | New |
//!
//! Markers hold a small JSON record for operators, but only their presence
//! is read back. The Running marker is created exclusively, so two runs of
//! the same capture cannot both start. Terminal markers are written to a
//! temp file and renamed into place: the rename is the commit point.
//!
//! A process killed mid-run leaves the capture in Running forever. Nothing
//! here detects that; clear the capture's markers by hand to rerun it.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StatusError;
use tpahelper_core::io::write_atomic;

/// Marker written before the first stage runs.
pub const CREATED_MARKER: &str = "task_created.txt";

/// Marker written after the last stage succeeds.
pub const DONE_MARKER: &str = "all_tasks_complete.txt";

/// Marker written after the first stage failure.
pub const FAILED_MARKER: &str = "did_not_complete.txt";

/// Lifecycle state of a capture's pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    New,
    Running,
    Done,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::New => "New",
            TaskStatus::Running => "Running",
            TaskStatus::Done => "Done",
            TaskStatus::Failed => "Failed",
        }
    }

    /// Done and Failed are permanent.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Failed)
    }

    /// New → Running → {Done | Failed}, nothing else.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::New, TaskStatus::Running)
                | (TaskStatus::Running, TaskStatus::Done)
                | (TaskStatus::Running, TaskStatus::Failed)
        )
    }

    /// Marker file encoding this state, if it has one.
    pub fn marker(&self) -> Option<&'static str> {
        match self {
            TaskStatus::New => None,
            TaskStatus::Running => Some(CREATED_MARKER),
            TaskStatus::Done => Some(DONE_MARKER),
            TaskStatus::Failed => Some(FAILED_MARKER),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contents of a marker file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerRecord {
    pub status: TaskStatus,
    /// RFC 3339 time the marker was written.
    pub at: String,
    pub pid: u32,
    /// Stage that failed, on the Failed marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl MarkerRecord {
    fn now(status: TaskStatus, stage: Option<&str>) -> Self {
        Self {
            status,
            at: Utc::now().to_rfc3339(),
            pid: std::process::id(),
            stage: stage.map(str::to_string),
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = serde_json::to_vec_pretty(self).unwrap_or_default();
        bytes.push(b'\n');
        bytes
    }
}

/// Reads and advances one capture's status.
#[derive(Debug, Clone)]
pub struct StatusTracker {
    capture: String,
    dir: PathBuf,
}

impl StatusTracker {
    /// Tracker for `capture` whose markers live in `dir`.
    pub fn new(capture: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            capture: capture.into(),
            dir: dir.into(),
        }
    }

    pub fn capture(&self) -> &str {
        &self.capture
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the marker for `status`.
    pub fn marker_path(&self, status: TaskStatus) -> Option<PathBuf> {
        status.marker().map(|m| self.dir.join(m))
    }

    fn has_marker(&self, status: TaskStatus) -> bool {
        self.marker_path(status).is_some_and(|p| p.exists())
    }

    /// Current state, from marker presence.
    pub fn status(&self) -> TaskStatus {
        [TaskStatus::Done, TaskStatus::Failed, TaskStatus::Running]
            .into_iter()
            .find(|s| self.has_marker(*s))
            .unwrap_or(TaskStatus::New)
    }

    /// The record stored in the marker for the current state, if readable.
    pub fn record(&self) -> Option<MarkerRecord> {
        let path = self.marker_path(self.status())?;
        let text = fs::read_to_string(path).ok()?;
        serde_json::from_str(&text).ok()
    }

    /// New → Running. Creates the output directory.
    ///
    /// Fails with [`StatusError::AlreadyRunning`] if another run holds the
    /// capture, and with [`StatusError::InvalidTransition`] if the capture
    /// has already finished.
    pub fn begin(&self) -> Result<(), StatusError> {
        let current = self.status();
        match current {
            TaskStatus::New => {}
            TaskStatus::Running => {
                return Err(StatusError::AlreadyRunning {
                    capture: self.capture.clone(),
                })
            }
            _ => return Err(self.invalid(current, TaskStatus::Running)),
        }

        fs::create_dir_all(&self.dir).map_err(|source| StatusError::Marker {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(CREATED_MARKER);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StatusError::AlreadyRunning {
                    capture: self.capture.clone(),
                })
            }
            Err(source) => return Err(StatusError::Marker { path, source }),
        };

        // Presence is what counts; the body is informational.
        let record = MarkerRecord::now(TaskStatus::Running, None);
        if let Err(e) = file.write_all(&record.to_bytes()) {
            debug!(path = %path.display(), error = %e, "could not fill running marker");
        }

        info!(capture = %self.capture, "status New -> Running");
        Ok(())
    }

    /// Running → Done.
    pub fn complete(&self) -> Result<(), StatusError> {
        self.finish(TaskStatus::Done, None)
    }

    /// Running → Failed, recording the failing stage.
    pub fn fail(&self, stage: Option<&str>) -> Result<(), StatusError> {
        self.finish(TaskStatus::Failed, stage)
    }

    fn finish(&self, to: TaskStatus, stage: Option<&str>) -> Result<(), StatusError> {
        let current = self.status();
        if !current.can_transition_to(to) {
            return Err(self.invalid(current, to));
        }

        let path = self.dir.join(to.marker().unwrap_or(DONE_MARKER));
        let record = MarkerRecord::now(to, stage);
        write_atomic(&path, &record.to_bytes())
            .map_err(|source| StatusError::Marker { path, source })?;

        info!(capture = %self.capture, "status Running -> {to}");
        Ok(())
    }

    fn invalid(&self, from: TaskStatus, to: TaskStatus) -> StatusError {
        StatusError::InvalidTransition {
            capture: self.capture.clone(),
            from,
            to,
        }
    }
}
