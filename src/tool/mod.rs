//! External tool invocation.
//!
//! Every stage that shells out goes through [`ToolRunner`], which runs one
//! program to completion and hands back its exit status, captured output
//! and wall time. [`ProcessRunner`] is the real implementation; tests swap
//! in a fake.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::ToolPaths;

/// Which configured executable a stage calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// Packet decoder / filter (`tshark`)
    Decoder,
    /// Capture statistics (`capinfos`)
    CaptureInfo,
    /// Deep-packet-inspection summarizer (`ndpiReader`)
    Dpi,
    /// Language-like string extraction (`strictstrings`)
    Strings,
}

impl ToolKind {
    /// Executable for this tool under `tools`.
    pub fn program<'a>(&self, tools: &'a ToolPaths) -> &'a str {
        match self {
            ToolKind::Decoder => &tools.tshark,
            ToolKind::CaptureInfo => &tools.capinfos,
            ToolKind::Dpi => &tools.ndpi,
            ToolKind::Strings => &tools.strings,
        }
    }
}

/// A fully resolved command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Outcome of one finished tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub duration: Duration,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Last few lines of stderr, for error messages.
    pub fn stderr_tail(&self, lines: usize) -> String {
        let text = String::from_utf8_lossy(&self.stderr);
        let all: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        all[all.len().saturating_sub(lines)..].join("\n")
    }
}

/// Runs an external program synchronously.
pub trait ToolRunner: Send + Sync {
    /// Run to completion. `Err` means the program could not be started.
    fn run(&self, invocation: &ToolInvocation) -> io::Result<ToolOutput>;
}

/// Runs tools as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &ToolInvocation) -> io::Result<ToolOutput> {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }

        debug!(command = %invocation, "running");
        let started = Instant::now();
        let output = command.output()?;
        let duration = started.elapsed();
        debug!(
            program = %invocation.program,
            status = ?output.status.code(),
            elapsed_ms = duration.as_millis() as u64,
            "finished"
        );

        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
            duration,
        })
    }
}
