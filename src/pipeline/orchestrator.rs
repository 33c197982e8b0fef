//! Runs a capture's stages in order and records the outcome.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{error, info, info_span, warn};

use tpahelper_core::io::write_atomic;

use super::extract::run_point_values;
use super::{Stage, StageAction, StageRegistry, ToolSpec};
use crate::capture::Capture;
use crate::config::Config;
use crate::error::{Error, PipelineError, Result, StatusError};
use crate::status::{StatusTracker, TaskStatus};
use crate::tool::ToolRunner;

/// What `run` did for a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every stage ran and succeeded.
    Completed,
    /// The capture was already Done; nothing ran.
    AlreadyDone,
    /// The capture had already failed; nothing ran.
    PreviouslyFailed,
}

impl RunOutcome {
    /// Status of the capture after the call.
    pub fn status(&self) -> TaskStatus {
        match self {
            RunOutcome::Completed | RunOutcome::AlreadyDone => TaskStatus::Done,
            RunOutcome::PreviouslyFailed => TaskStatus::Failed,
        }
    }
}

/// A declared artifact and whether it exists on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactInfo {
    pub stage: String,
    pub path: PathBuf,
    pub exists: bool,
}

/// Runs the stage catalogue against captures.
///
/// Cheap to clone; clones share the registry and the tool runner.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    config: Arc<Config>,
    registry: Arc<StageRegistry>,
    runner: Arc<dyn ToolRunner>,
}

impl PipelineOrchestrator {
    pub fn new(config: Config, registry: StageRegistry, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            runner,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    /// Output directory for `capture`.
    pub fn output_dir(&self, capture: &Capture) -> PathBuf {
        capture.output_dir(&self.config.output_dir)
    }

    pub fn tracker(&self, capture: &Capture) -> StatusTracker {
        StatusTracker::new(capture.name(), self.output_dir(capture))
    }

    /// Current status of `capture`.
    pub fn status(&self, capture: &Capture) -> TaskStatus {
        self.tracker(capture).status()
    }

    /// Every declared artifact for `capture`, in stage declaration order.
    pub fn artifacts(&self, capture: &Capture) -> Vec<ArtifactInfo> {
        let dir = self.output_dir(capture);
        self.registry
            .stages()
            .iter()
            .flat_map(|stage| {
                stage.artifacts().iter().map(|rel| {
                    let path = dir.join(rel);
                    ArtifactInfo {
                        stage: stage.name().to_string(),
                        exists: path.exists(),
                        path,
                    }
                })
            })
            .collect()
    }

    /// Run every stage for `capture`, once.
    ///
    /// A Done or Failed capture is left untouched. A stage failure stops the
    /// run, marks the capture Failed and is returned as the error.
    pub fn run(&self, capture: &Capture) -> Result<RunOutcome> {
        let order = self.registry.resolve()?;
        let tracker = self.tracker(capture);

        match tracker.status() {
            TaskStatus::Done => {
                info!(capture = capture.name(), "already done, nothing to run");
                return Ok(RunOutcome::AlreadyDone);
            }
            TaskStatus::Failed => {
                info!(capture = capture.name(), "previously failed, not rerunning");
                return Ok(RunOutcome::PreviouslyFailed);
            }
            TaskStatus::Running => {
                return Err(StatusError::AlreadyRunning {
                    capture: capture.name().to_string(),
                }
                .into())
            }
            TaskStatus::New => {}
        }

        if !capture.path().is_file() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("capture file {} not found", capture.path().display()),
            )));
        }

        tracker.begin()?;
        let dir = tracker.dir().to_path_buf();
        let started = Instant::now();

        for stage in order {
            let span = info_span!("stage", capture = capture.name(), stage = stage.name());
            let _guard = span.enter();

            if let Err(e) = self.run_stage(stage, capture, &dir) {
                error!(error = %e, "stage failed");
                if let Err(marker) = tracker.fail(Some(stage.name())) {
                    error!(error = %marker, "could not record failure");
                }
                return Err(e.into());
            }
        }

        if let Err(e) = tracker.complete() {
            error!(error = %e, "could not record completion");
            if let Err(marker) = tracker.fail(None) {
                error!(error = %marker, "could not record failure");
            }
            return Err(e.into());
        }
        info!(
            capture = capture.name(),
            stages = self.registry.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pipeline complete"
        );
        Ok(RunOutcome::Completed)
    }

    fn run_stage(
        &self,
        stage: &Stage,
        capture: &Capture,
        dir: &Path,
    ) -> std::result::Result<(), PipelineError> {
        for rel in stage.artifacts() {
            if let Some(parent) = dir.join(rel).parent() {
                fs::create_dir_all(parent).map_err(|source| PipelineError::Artifact {
                    stage: stage.name().to_string(),
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let started = Instant::now();
        match stage.action() {
            StageAction::Tool(spec) => self.run_tool(stage, spec, capture, dir)?,
            StageAction::PointValues {
                processor,
                dump,
                table,
                report,
            } => run_point_values(
                stage.name(),
                processor,
                &dir.join(dump),
                &dir.join(table),
                &dir.join(report),
            )?,
        }

        for rel in stage.artifacts() {
            let path = dir.join(rel);
            if !path.exists() {
                return Err(PipelineError::MissingArtifact {
                    stage: stage.name().to_string(),
                    path,
                });
            }
        }

        info!(elapsed_ms = started.elapsed().as_millis() as u64, "stage finished");
        Ok(())
    }

    fn run_tool(
        &self,
        stage: &Stage,
        spec: &ToolSpec,
        capture: &Capture,
        dir: &Path,
    ) -> std::result::Result<(), PipelineError> {
        let invocation = spec.invocation(&self.config.tools, capture, dir);
        info!(command = %invocation, "stage started");

        let output = self
            .runner
            .run(&invocation)
            .map_err(|source| PipelineError::Spawn {
                stage: stage.name().to_string(),
                tool: invocation.program.clone(),
                source,
            })?;

        if !output.success() {
            return Err(PipelineError::ExternalTool {
                stage: stage.name().to_string(),
                tool: invocation.program.clone(),
                code: output.exit_code,
                stderr: output.stderr_tail(5),
            });
        }
        if !output.stderr.is_empty() {
            warn!(stderr = %output.stderr_tail(3), "tool wrote to stderr");
        }

        if let Some(rel) = &spec.stdout {
            let path = dir.join(rel);
            write_atomic(&path, &output.stdout).map_err(|source| PipelineError::Artifact {
                stage: stage.name().to_string(),
                path,
                source,
            })?;
        }
        Ok(())
    }

    /// Run several captures, at most `workers` at a time.
    ///
    /// Each capture runs on its own blocking thread. Results come back in
    /// input order; one capture failing does not affect the others.
    pub async fn run_many(
        &self,
        captures: Vec<Capture>,
        workers: usize,
    ) -> Vec<(Capture, Result<RunOutcome>)> {
        let semaphore = Arc::new(Semaphore::new(workers.max(1)));
        let mut handles = Vec::with_capacity(captures.len());

        for capture in captures {
            let semaphore = semaphore.clone();
            let orchestrator = self.clone();
            let task_capture = capture.clone();
            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return Err(join_error(e)),
                };
                match tokio::task::spawn_blocking(move || orchestrator.run(&task_capture)).await {
                    Ok(result) => result,
                    Err(e) => Err(join_error(e)),
                }
            });
            handles.push((capture, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (capture, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(join_error(e)),
            };
            results.push((capture, result));
        }
        results
    }
}

fn join_error(e: impl std::fmt::Display) -> Error {
    PipelineError::Join(e.to_string()).into()
}

impl std::fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("config", &self.config)
            .field("stages", &self.registry.len())
            .finish_non_exhaustive()
    }
}
