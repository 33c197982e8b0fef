//! Shared fixtures: a fake tool runner and scratch captures.

#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tpahelper::capture::Capture;
use tpahelper::config::Config;
use tpahelper::pipeline::{default_stages, PipelineOrchestrator};
use tpahelper::tool::{ToolInvocation, ToolOutput, ToolRunner};
use tpahelper_core::protocol::default_registry;

type Predicate = Box<dyn Fn(&ToolInvocation) -> bool + Send + Sync>;
type Hook = Box<dyn Fn(&ToolInvocation) + Send + Sync>;

/// Stands in for the external tools.
///
/// Records every invocation, writes the files a real tool would write for
/// `-w` and `-k`, and answers the decoder's JSON dump request with a fixed
/// packet dump.
pub struct FakeTools {
    calls: Mutex<Vec<ToolInvocation>>,
    dump: String,
    fail: Option<Predicate>,
    unstartable: Option<Predicate>,
    write_files: bool,
    after: Option<Hook>,
}

impl FakeTools {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            dump: dnp3_dump(),
            fail: None,
            unstartable: None,
            write_files: true,
            after: None,
        }
    }

    pub fn with_dump(mut self, dump: impl Into<String>) -> Self {
        self.dump = dump.into();
        self
    }

    /// Exit with status 1 for matching invocations.
    pub fn failing(mut self, pred: impl Fn(&ToolInvocation) -> bool + Send + Sync + 'static) -> Self {
        self.fail = Some(Box::new(pred));
        self
    }

    /// Refuse to start matching invocations.
    pub fn unstartable(mut self, pred: impl Fn(&ToolInvocation) -> bool + Send + Sync + 'static) -> Self {
        self.unstartable = Some(Box::new(pred));
        self
    }

    /// Succeed without writing `-w`/`-k` outputs.
    pub fn without_files(mut self) -> Self {
        self.write_files = false;
        self
    }

    /// Run `hook` after every successful invocation.
    pub fn after(mut self, hook: impl Fn(&ToolInvocation) + Send + Sync + 'static) -> Self {
        self.after = Some(Box::new(hook));
        self
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }
}

impl ToolRunner for FakeTools {
    fn run(&self, invocation: &ToolInvocation) -> io::Result<ToolOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        if self.unstartable.as_ref().is_some_and(|p| p(invocation)) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such file or directory"));
        }
        if self.fail.as_ref().is_some_and(|p| p(invocation)) {
            return Ok(ToolOutput {
                exit_code: Some(1),
                stdout: Vec::new(),
                stderr: b"fatal: cannot open capture\n".to_vec(),
                duration: Duration::from_millis(3),
            });
        }

        if self.write_files {
            for pair in invocation.args.windows(2) {
                if pair[0] == "-w" || pair[0] == "-k" {
                    fs::write(&pair[1], b"fake tool output")?;
                }
            }
        }

        if let Some(hook) = &self.after {
            hook(invocation);
        }

        let stdout = if invocation.args.iter().any(|a| a == "-T") {
            self.dump.clone().into_bytes()
        } else {
            format!("{} summary\n", invocation.program).into_bytes()
        };
        Ok(ToolOutput {
            exit_code: Some(0),
            stdout,
            stderr: Vec::new(),
            duration: Duration::from_millis(3),
        })
    }
}

/// Invocation mentions `needle` as its program or in an argument.
pub fn mentions(invocation: &ToolInvocation, needle: &str) -> bool {
    invocation.program == needle || invocation.args.iter().any(|a| a.contains(needle))
}

/// One packet in the decoder's `-T json` layout.
pub fn dnp3_packet(frame_time: &str, points: &[(&str, &str)]) -> String {
    let objects: Vec<String> = points
        .iter()
        .enumerate()
        .map(|(i, (index, value))| {
            format!(
                r#""Point Number {i}": {{"dnp3.al.index": "{index}", "dnp3.al.timestamp": "{frame_time}", "dnp3.al.ana.float": "{value}"}}"#
            )
        })
        .collect();
    format!(
        r#"{{"_source": {{"layers": {{
            "frame": {{"frame.time": "{frame_time}", "frame.time_utc": "{frame_time}"}},
            "dnp3": {{"Application Layer": {{"RESPONSE Data Objects": {{ {} }}}}}}
        }}}}}}"#,
        objects.join(", ")
    )
}

/// Two seconds of readings for points 0 and 1.
pub fn dnp3_dump() -> String {
    let packets = [
        dnp3_packet("Mar  5, 2024 10:00:00.100000000 UTC", &[("0", "10.0"), ("1", "1.0")]),
        dnp3_packet("Mar  5, 2024 10:00:00.700000000 UTC", &[("0", "20.0")]),
        dnp3_packet("Mar  5, 2024 10:00:01.400000000 UTC", &[("1", "3.5")]),
    ];
    format!("[\n{}\n]\n", packets.join(",\n"))
}

/// Scratch workspace with an output root and capture files.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn output_root(&self) -> PathBuf {
        self.dir.path().join("processed")
    }

    /// A capture file named `<name>.pcap` with placeholder bytes.
    pub fn capture(&self, name: &str) -> Capture {
        let path = self.dir.path().join("uploads").join(format!("{name}.pcap"));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"\xd4\xc3\xb2\xa1placeholder").unwrap();
        Capture::new(path)
    }

    pub fn config(&self) -> Config {
        Config {
            output_dir: self.output_root(),
            ..Config::default()
        }
    }

    pub fn orchestrator(&self, tools: Arc<FakeTools>) -> PipelineOrchestrator {
        let stages = default_stages(&default_registry()).unwrap();
        PipelineOrchestrator::new(self.config(), stages, tools)
    }
}

/// Every file under `dir` with its contents, sorted by path.
pub fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(d) = pending.pop() {
        for entry in fs::read_dir(&d).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                let bytes = fs::read(&path).unwrap();
                files.push((path, bytes));
            }
        }
    }
    files.sort();
    files
}
