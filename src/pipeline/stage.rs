//! Stage definitions.

use std::path::{Path, PathBuf};

use tpahelper_core::protocol::BuiltinProcessor;

use crate::capture::Capture;
use crate::config::ToolPaths;
use crate::tool::{ToolInvocation, ToolKind};

/// One command-line argument, resolved per capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Literal(String),
    /// The capture file itself.
    Capture,
    /// A path relative to the capture's output directory.
    Artifact(PathBuf),
}

impl Arg {
    pub fn lit(value: impl Into<String>) -> Self {
        Arg::Literal(value.into())
    }

    pub fn artifact(path: impl Into<PathBuf>) -> Self {
        Arg::Artifact(path.into())
    }

    fn resolve(&self, capture: &Capture, out_dir: &Path) -> String {
        match self {
            Arg::Literal(value) => value.clone(),
            Arg::Capture => capture.path().to_string_lossy().into_owned(),
            Arg::Artifact(rel) => out_dir.join(rel).to_string_lossy().into_owned(),
        }
    }
}

/// An external tool call: which tool, its arguments, and where its stdout goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub tool: ToolKind,
    pub args: Vec<Arg>,
    /// Artifact receiving the tool's stdout, relative to the output directory.
    pub stdout: Option<PathBuf>,
}

impl ToolSpec {
    pub fn new(tool: ToolKind) -> Self {
        Self {
            tool,
            args: Vec::new(),
            stdout: None,
        }
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn literals<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Arg::lit));
        self
    }

    pub fn stdout_to(mut self, rel: impl Into<PathBuf>) -> Self {
        self.stdout = Some(rel.into());
        self
    }

    /// Concrete command line for `capture`, run from `out_dir`.
    pub fn invocation(&self, tools: &ToolPaths, capture: &Capture, out_dir: &Path) -> ToolInvocation {
        ToolInvocation::new(self.tool.program(tools))
            .args(self.args.iter().map(|a| a.resolve(capture, out_dir)))
            .current_dir(out_dir)
    }
}

/// What a stage does when it runs.
#[derive(Debug, Clone)]
pub enum StageAction {
    /// Run an external tool.
    Tool(ToolSpec),
    /// Turn a decoded packet dump into a point-value table and report.
    PointValues {
        processor: BuiltinProcessor,
        dump: PathBuf,
        table: PathBuf,
        report: PathBuf,
    },
}

/// One step of the pipeline.
#[derive(Debug, Clone)]
pub struct Stage {
    name: String,
    dependencies: Vec<String>,
    artifacts: Vec<PathBuf>,
    action: StageAction,
}

impl Stage {
    /// A tool stage. Its stdout target, if any, is declared as an artifact.
    pub fn tool(name: impl Into<String>, spec: ToolSpec) -> Self {
        let artifacts = spec.stdout.iter().cloned().collect();
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            artifacts,
            action: StageAction::Tool(spec),
        }
    }

    /// A point-value stage reading `dump` and declaring `table` and `report`.
    pub fn point_values(
        name: impl Into<String>,
        processor: BuiltinProcessor,
        dump: impl Into<PathBuf>,
        table: impl Into<PathBuf>,
        report: impl Into<PathBuf>,
    ) -> Self {
        let (table, report) = (table.into(), report.into());
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            artifacts: vec![table.clone(), report.clone()],
            action: StageAction::PointValues {
                processor,
                dump: dump.into(),
                table,
                report,
            },
        }
    }

    pub fn depends_on(mut self, stage: impl Into<String>) -> Self {
        self.dependencies.push(stage.into());
        self
    }

    /// Declare an artifact the stage's tool writes itself.
    pub fn produces(mut self, rel: impl Into<PathBuf>) -> Self {
        let rel = rel.into();
        if !self.artifacts.contains(&rel) {
            self.artifacts.push(rel);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Declared artifacts, relative to the capture's output directory.
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    pub fn action(&self) -> &StageAction {
        &self.action
    }
}
