//! Runtime configuration.
//!
//! Every setting resolves as: command-line flag, then environment variable,
//! then built-in default.
//!
//! | Setting | Variable | Default |
//! |---------|----------|---------|
//! | output root | `TPAHELPER_OUTPUT_DIR` | `<local data dir>/tpahelper/processed` |
//! | workers | `TPAHELPER_WORKERS` | 1 |
//! | packet decoder | `TPAHELPER_TSHARK` | `tshark` |
//! | capture info | `TPAHELPER_CAPINFOS` | `capinfos` |
//! | DPI summarizer | `TPAHELPER_NDPI` | `ndpiReader` |
//! | string extraction | `TPAHELPER_STRINGS` | `strictstrings` |

use std::path::PathBuf;

use tracing::warn;

pub const ENV_OUTPUT_DIR: &str = "TPAHELPER_OUTPUT_DIR";
pub const ENV_WORKERS: &str = "TPAHELPER_WORKERS";
pub const ENV_TSHARK: &str = "TPAHELPER_TSHARK";
pub const ENV_CAPINFOS: &str = "TPAHELPER_CAPINFOS";
pub const ENV_NDPI: &str = "TPAHELPER_NDPI";
pub const ENV_STRINGS: &str = "TPAHELPER_STRINGS";

/// External tool executables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub tshark: String,
    pub capinfos: String,
    pub ndpi: String,
    pub strings: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            tshark: "tshark".to_string(),
            capinfos: "capinfos".to_string(),
            ndpi: "ndpiReader".to_string(),
            strings: "strictstrings".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root under which each capture gets its own directory.
    pub output_dir: PathBuf,
    /// Captures processed at once by `analyze`.
    pub workers: usize,
    pub tools: ToolPaths,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            workers: 1,
            tools: ToolPaths::default(),
        }
    }
}

/// `<local data dir>/tpahelper/processed`, or `./processed` without one.
pub fn default_output_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tpahelper").join("processed"))
        .unwrap_or_else(|| PathBuf::from("processed"))
}

impl Config {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get(ENV_OUTPUT_DIR) {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(workers) = get(ENV_WORKERS) {
            match workers.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.workers = n,
                _ => warn!("{ENV_WORKERS}={workers:?} is not a positive integer, using {}", config.workers),
            }
        }
        if let Some(tool) = get(ENV_TSHARK) {
            config.tools.tshark = tool;
        }
        if let Some(tool) = get(ENV_CAPINFOS) {
            config.tools.capinfos = tool;
        }
        if let Some(tool) = get(ENV_NDPI) {
            config.tools.ndpi = tool;
        }
        if let Some(tool) = get(ENV_STRINGS) {
            config.tools.strings = tool;
        }
        config
    }
}
