//! Capture identity.

use std::path::{Path, PathBuf};

/// One packet-capture file under analysis.
///
/// The name is the file stem; it names the capture's output directory
/// under the output root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Capture {
    name: String,
    path: PathBuf,
}

impl Capture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "capture".to_string());
        Self { name, path }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding this capture's artifacts and markers.
    pub fn output_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.name)
    }
}
