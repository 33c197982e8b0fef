//! Command-line argument definitions.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use super::OutputFormat;
use crate::config::Config;

/// Export file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Apache Parquet columnar format
    Parquet,
    /// JSON Lines (one JSON object per row)
    Json,
    /// Comma-separated values
    Csv,
}

impl ExportFormat {
    /// Infer export format from file extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "parquet" | "pq" => Some(ExportFormat::Parquet),
            "json" | "jsonl" | "ndjson" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }
}

/// Run the packet-capture extraction pipeline and inspect its results.
#[derive(Parser, Debug)]
#[command(name = "tpahelper")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Root directory for per-capture output [env: TPAHELPER_OUTPUT_DIR]
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Packet decoder executable [env: TPAHELPER_TSHARK]
    #[arg(long, global = true, value_name = "PATH")]
    pub tshark: Option<String>,

    /// Capture statistics executable [env: TPAHELPER_CAPINFOS]
    #[arg(long, global = true, value_name = "PATH")]
    pub capinfos: Option<String>,

    /// DPI summarizer executable [env: TPAHELPER_NDPI]
    #[arg(long, global = true, value_name = "PATH")]
    pub ndpi: Option<String>,

    /// String extraction executable [env: TPAHELPER_STRINGS]
    #[arg(long, global = true, value_name = "PATH")]
    pub strings: Option<String>,

    /// Enable verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline for one capture in the foreground
    Run {
        /// Capture file
        #[arg(value_name = "PCAP")]
        pcap: PathBuf,
    },

    /// Run the pipeline for several captures concurrently
    Analyze {
        /// Capture files
        #[arg(value_name = "PCAP", required = true)]
        pcaps: Vec<PathBuf>,

        /// Captures processed at once [env: TPAHELPER_WORKERS]
        #[arg(short = 'j', long)]
        workers: Option<usize>,
    },

    /// Print the status of a capture (New, Running, Done, Failed)
    Status {
        #[arg(value_name = "PCAP")]
        pcap: PathBuf,
    },

    /// List a capture's declared artifacts and whether they exist
    Outputs {
        #[arg(value_name = "PCAP")]
        pcap: PathBuf,
    },

    /// List pipeline stages in run order
    Stages,

    /// Print or export a capture's point-value table
    Table {
        #[arg(value_name = "PCAP")]
        pcap: PathBuf,

        /// Point-value protocol
        #[arg(short = 'p', long, default_value = "dnp3")]
        protocol: String,

        /// Output format for stdout
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Only the first N rows
        #[arg(long, value_name = "N")]
        head: Option<usize>,

        /// Export the table to a file
        #[arg(short = 'o', long = "output", value_name = "OUTPUT_FILE")]
        output: Option<PathBuf>,

        /// Export format (inferred from extension if not specified)
        #[arg(long = "export-format", value_enum, value_name = "FORMAT")]
        export_format: Option<ExportFormat>,
    },
}

impl Args {
    /// `base` with command-line overrides applied.
    pub fn apply(&self, mut base: Config) -> Config {
        if let Some(dir) = &self.output_dir {
            base.output_dir = dir.clone();
        }
        if let Commands::Analyze {
            workers: Some(workers),
            ..
        } = &self.command
        {
            base.workers = (*workers).max(1);
        }
        let overrides = [
            (&self.tshark, &mut base.tools.tshark),
            (&self.capinfos, &mut base.tools.capinfos),
            (&self.ndpi, &mut base.tools.ndpi),
            (&self.strings, &mut base.tools.strings),
        ];
        for (flag, slot) in overrides {
            if let Some(value) = flag {
                *slot = value.clone();
            }
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "tpahelper",
            "analyze",
            "a.pcap",
            "b.pcap",
            "-j",
            "3",
            "--output-dir",
            "/srv/out",
            "--ndpi",
            "/opt/ndpi/ndpiReader",
        ])
        .unwrap();

        let config = args.apply(Config::default());
        assert_eq!(config.workers, 3);
        assert_eq!(config.output_dir, PathBuf::from("/srv/out"));
        assert_eq!(config.tools.ndpi, "/opt/ndpi/ndpiReader");
        assert_eq!(config.tools.tshark, "tshark");
        match args.command {
            Commands::Analyze { pcaps, .. } => assert_eq!(pcaps.len(), 2),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_table_defaults() {
        let args = Args::try_parse_from(["tpahelper", "table", "a.pcap", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
        match args.command {
            Commands::Table {
                protocol, format, head, output, ..
            } => {
                assert_eq!(protocol, "dnp3");
                assert_eq!(format, OutputFormat::Table);
                assert!(head.is_none());
                assert!(output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_analyze_requires_captures() {
        assert!(Args::try_parse_from(["tpahelper", "analyze"]).is_err());
    }

    #[test]
    fn test_export_format_from_extension() {
        assert_eq!(
            ExportFormat::from_extension(Path::new("values.PQ")),
            Some(ExportFormat::Parquet)
        );
        assert_eq!(
            ExportFormat::from_extension(Path::new("values.ndjson")),
            Some(ExportFormat::Json)
        );
        assert_eq!(
            ExportFormat::from_extension(Path::new("values.csv")),
            Some(ExportFormat::Csv)
        );
        assert_eq!(ExportFormat::from_extension(Path::new("values.txt")), None);
        assert_eq!(ExportFormat::from_extension(Path::new("values")), None);
    }
}
