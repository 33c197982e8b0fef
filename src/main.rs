//! tpahelper CLI entry point.

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tpahelper::capture::Capture;
use tpahelper::cli::{Args, Commands, ExportFormat, Exporter, OutputFormat, OutputFormatter};
use tpahelper::config::Config;
use tpahelper::pipeline::{default_stages, stages, PipelineOrchestrator, RunOutcome};
use tpahelper::status::TaskStatus;
use tpahelper::tool::ProcessRunner;
use tpahelper_core::protocol::default_registry;
use tpahelper_core::read_parquet;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();

    let config = args.apply(Config::from_env());
    let catalogue = default_stages(&default_registry()).context("Invalid stage catalogue")?;
    let orchestrator = PipelineOrchestrator::new(config, catalogue, Arc::new(ProcessRunner));

    match args.command {
        Commands::Run { pcap } => {
            let capture = Capture::new(pcap);
            let worker = orchestrator.clone();
            let task_capture = capture.clone();
            let outcome = tokio::task::spawn_blocking(move || worker.run(&task_capture))
                .await
                .context("Pipeline worker panicked")?
                .with_context(|| format!("Pipeline failed for {}", capture.path().display()))?;
            report_outcome(&capture, outcome);
        }

        Commands::Analyze { pcaps, .. } => {
            let captures: Vec<Capture> = pcaps.into_iter().map(Capture::new).collect();
            let total = captures.len();
            let workers = orchestrator.config().workers;

            let mut failed = 0;
            for (capture, result) in orchestrator.run_many(captures, workers).await {
                match result {
                    Ok(outcome) => report_outcome(&capture, outcome),
                    Err(e) => {
                        failed += 1;
                        eprintln!("{}: {e}", capture.name());
                    }
                }
            }
            if failed > 0 {
                bail!("{failed} of {total} captures failed");
            }
        }

        Commands::Status { pcap } => {
            let capture = Capture::new(pcap);
            println!("{}", orchestrator.status(&capture));
        }

        Commands::Outputs { pcap } => {
            let capture = Capture::new(pcap);
            for artifact in orchestrator.artifacts(&capture) {
                let mark = if artifact.exists { "yes" } else { "no" };
                println!("{:<20} {:<4} {}", artifact.stage, mark, artifact.path.display());
            }
        }

        Commands::Stages => list_stages(&orchestrator)?,

        Commands::Table {
            pcap,
            protocol,
            format,
            head,
            output,
            export_format,
        } => {
            let capture = Capture::new(pcap);
            let path = orchestrator
                .output_dir(&capture)
                .join(stages::point_values_table(&protocol));
            show_table(&path, format, head, output.as_deref(), export_format)?;
        }
    }

    Ok(())
}

fn report_outcome(capture: &Capture, outcome: RunOutcome) {
    match outcome {
        RunOutcome::Completed => println!("{}: {}", capture.name(), TaskStatus::Done),
        RunOutcome::AlreadyDone => println!("{}: {} (already complete)", capture.name(), TaskStatus::Done),
        RunOutcome::PreviouslyFailed => {
            println!("{}: {} (earlier run failed, not rerun)", capture.name(), TaskStatus::Failed)
        }
    }
}

fn list_stages(orchestrator: &PipelineOrchestrator) -> Result<()> {
    let order = orchestrator.registry().resolve()?;

    println!("Pipeline stages (run order):");
    println!("{:-<60}", "");
    for (i, stage) in order.iter().enumerate() {
        println!("{:>2}. {}", i + 1, stage.name());
        if !stage.dependencies().is_empty() {
            println!("      after: {}", stage.dependencies().join(", "));
        }
        for artifact in stage.artifacts() {
            println!("      -> {}", artifact.display());
        }
    }
    Ok(())
}

fn show_table(
    path: &Path,
    format: OutputFormat,
    head: Option<usize>,
    output: Option<&Path>,
    export_format: Option<ExportFormat>,
) -> Result<()> {
    let table = read_parquet(path)
        .with_context(|| format!("No point-value table at {}", path.display()))?;
    let mut batch = table.to_record_batch()?;
    if let Some(n) = head {
        batch = batch.slice(0, n.min(batch.num_rows()));
    }

    if let Some(output_path) = output {
        let export_format = export_format
            .or_else(|| ExportFormat::from_extension(output_path))
            .unwrap_or(ExportFormat::Parquet);

        let rows = Exporter::export(output_path, export_format, &[batch])
            .with_context(|| format!("Failed to export to {}", output_path.display()))?;
        eprintln!("Exported {} rows to {}", rows, output_path.display());
    } else {
        OutputFormatter::new(format).write(&batch, &mut io::stdout())?;
    }
    Ok(())
}
