//! End-to-end pipeline runs against a fake tool runner.

mod common;

use std::fs;
use std::sync::Arc;

use common::{mentions, snapshot, FakeTools, Workspace};
use tpahelper::error::{Error, PipelineError, StatusError};
use tpahelper::pipeline::{stages, RunOutcome};
use tpahelper::status::{StatusTracker, TaskStatus, CREATED_MARKER, DONE_MARKER, FAILED_MARKER};
use tpahelper_core::io::temp_path;
use tpahelper_core::read_parquet;
use tpahelper_core::series::no_data_marker;

#[test]
fn test_full_run_produces_every_artifact() {
    let ws = Workspace::new();
    let tools = Arc::new(FakeTools::new());
    let orchestrator = ws.orchestrator(tools.clone());
    let capture = ws.capture("plant1");

    assert_eq!(orchestrator.status(&capture), TaskStatus::New);
    assert_eq!(orchestrator.run(&capture).unwrap(), RunOutcome::Completed);
    assert_eq!(orchestrator.status(&capture), TaskStatus::Done);

    assert_eq!(
        tools.programs(),
        vec!["capinfos", "tshark", "ndpiReader", "strictstrings", "tshark", "tshark"]
    );

    let artifacts = orchestrator.artifacts(&capture);
    assert_eq!(artifacts.len(), 9);
    for artifact in &artifacts {
        assert!(artifact.exists, "{} missing", artifact.path.display());
    }

    let dir = orchestrator.output_dir(&capture);
    assert_eq!(
        fs::read_to_string(dir.join(stages::CAPINFOS_TXT)).unwrap(),
        "capinfos summary\n"
    );
    for marker in [CREATED_MARKER, DONE_MARKER] {
        assert!(dir.join(marker).exists());
    }
    assert!(!dir.join(FAILED_MARKER).exists());

    let table = read_parquet(&dir.join(stages::point_values_table("dnp3"))).unwrap();
    assert_eq!(table.num_rows(), 2);
    assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["0", "1"]);
    assert_eq!(table.column("0"), Some(&[15.0, 0.0][..]));
    assert_eq!(table.column("1"), Some(&[1.0, 3.5][..]));

    let report = fs::read_to_string(dir.join(stages::point_values_report("dnp3"))).unwrap();
    assert!(report.contains("<table>"));
}

#[test]
fn test_stage_arguments_chain_artifacts() {
    let ws = Workspace::new();
    let tools = Arc::new(FakeTools::new());
    let orchestrator = ws.orchestrator(tools.clone());
    let capture = ws.capture("plant1");
    orchestrator.run(&capture).unwrap();

    let dir = orchestrator.output_dir(&capture);
    let filtered = dir.join(stages::filtered_capture("dnp3")).to_string_lossy().into_owned();
    let calls = tools.calls();

    let capinfos = &calls[0];
    assert_eq!(capinfos.args, vec!["-TmQ".to_string(), capture.path().to_string_lossy().into_owned()]);

    let filter = &calls[4];
    assert!(filter.args.windows(2).any(|w| w[0] == "-w" && w[1] == filtered));
    assert!(filter.args.windows(2).any(|w| w[0] == "-Y" && w[1] == "dnp3"));

    let dump = &calls[5];
    assert_eq!(dump.args[..2], ["-r".to_string(), filtered]);
    assert!(dump.args.iter().any(|a| a == "frame ip dnp3"));
    assert!(calls.iter().all(|c| c.cwd.as_deref() == Some(dir.as_path())));
}

#[test]
fn test_rerun_of_done_capture_is_noop() {
    let ws = Workspace::new();
    let tools = Arc::new(FakeTools::new());
    let orchestrator = ws.orchestrator(tools.clone());
    let capture = ws.capture("plant1");

    orchestrator.run(&capture).unwrap();
    let calls = tools.calls().len();
    let before = snapshot(&orchestrator.output_dir(&capture));

    assert_eq!(orchestrator.run(&capture).unwrap(), RunOutcome::AlreadyDone);
    assert_eq!(tools.calls().len(), calls);
    assert_eq!(snapshot(&orchestrator.output_dir(&capture)), before);
}

#[test]
fn test_tool_failure_marks_failed_and_stops() {
    let ws = Workspace::new();
    let tools = Arc::new(FakeTools::new().failing(|inv| inv.program == "ndpiReader"));
    let orchestrator = ws.orchestrator(tools.clone());
    let capture = ws.capture("plant1");

    let err = orchestrator.run(&capture).unwrap_err();
    match err {
        Error::Pipeline(PipelineError::ExternalTool { stage, tool, code, stderr }) => {
            assert_eq!(stage, "ndpi");
            assert_eq!(tool, "ndpiReader");
            assert_eq!(code, Some(1));
            assert!(stderr.contains("cannot open capture"));
        }
        other => panic!("unexpected error {other:?}"),
    }

    assert_eq!(orchestrator.status(&capture), TaskStatus::Failed);
    assert_eq!(tools.programs(), vec!["capinfos", "tshark", "ndpiReader"]);

    let dir = orchestrator.output_dir(&capture);
    assert!(!dir.join(DONE_MARKER).exists());
    let tracker = StatusTracker::new(capture.name(), &dir);
    assert_eq!(tracker.record().unwrap().stage.as_deref(), Some("ndpi"));

    // Failed is permanent: a rerun does nothing.
    assert_eq!(orchestrator.run(&capture).unwrap(), RunOutcome::PreviouslyFailed);
    assert_eq!(tools.calls().len(), 3);
}

#[test]
fn test_unrecordable_completion_marks_failed() {
    let ws = Workspace::new();
    // A directory squatting on the Done marker's temp file makes its write fail.
    let tools = Arc::new(FakeTools::new().after(|inv| {
        if let Some(dir) = inv.cwd.as_deref() {
            fs::create_dir_all(temp_path(&dir.join(DONE_MARKER)).join("blocker")).unwrap();
        }
    }));
    let orchestrator = ws.orchestrator(tools.clone());
    let capture = ws.capture("plant1");

    let err = orchestrator.run(&capture).unwrap_err();
    assert!(matches!(err, Error::Status(StatusError::Marker { .. })));
    assert_eq!(tools.calls().len(), 6);

    let dir = orchestrator.output_dir(&capture);
    assert!(!dir.join(DONE_MARKER).exists());
    assert_eq!(orchestrator.status(&capture), TaskStatus::Failed);
    let tracker = StatusTracker::new(capture.name(), &dir);
    assert_eq!(tracker.record().unwrap().stage, None);
}

#[test]
fn test_unstartable_tool_fails_pipeline() {
    let ws = Workspace::new();
    let tools = Arc::new(FakeTools::new().unstartable(|inv| inv.program == "strictstrings"));
    let orchestrator = ws.orchestrator(tools);
    let capture = ws.capture("plant1");

    let err = orchestrator.run(&capture).unwrap_err();
    assert!(matches!(
        err,
        Error::Pipeline(PipelineError::Spawn { ref stage, .. }) if stage == "strings"
    ));
    assert_eq!(orchestrator.status(&capture), TaskStatus::Failed);
}

#[test]
fn test_missing_declared_artifact_fails_stage() {
    let ws = Workspace::new();
    let tools = Arc::new(FakeTools::new().without_files());
    let orchestrator = ws.orchestrator(tools.clone());
    let capture = ws.capture("plant1");

    let err = orchestrator.run(&capture).unwrap_err();
    match err {
        Error::Pipeline(PipelineError::MissingArtifact { stage, path }) => {
            assert_eq!(stage, "ndpi");
            assert!(path.ends_with(stages::NDPI_FLOWS_JSON));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(orchestrator.status(&capture), TaskStatus::Failed);
}

#[test]
fn test_empty_extraction_still_completes() {
    let ws = Workspace::new();
    let tools = Arc::new(FakeTools::new().with_dump("[]"));
    let orchestrator = ws.orchestrator(tools);
    let capture = ws.capture("quiet");

    assert_eq!(orchestrator.run(&capture).unwrap(), RunOutcome::Completed);

    let dir = orchestrator.output_dir(&capture);
    let table = read_parquet(&dir.join(stages::point_values_table("dnp3"))).unwrap();
    assert!(table.is_empty());
    assert_eq!(
        fs::read_to_string(dir.join(stages::point_values_report("dnp3"))).unwrap(),
        no_data_marker("DNP3")
    );
}

#[test]
fn test_truncated_dump_keeps_packets_read() {
    let ws = Workspace::new();
    let dump = common::dnp3_dump();
    let cut = &dump[..dump.len() - 40];
    let tools = Arc::new(FakeTools::new().with_dump(cut));
    let orchestrator = ws.orchestrator(tools);
    let capture = ws.capture("cut");

    assert_eq!(orchestrator.run(&capture).unwrap(), RunOutcome::Completed);

    let dir = orchestrator.output_dir(&capture);
    let table = read_parquet(&dir.join(stages::point_values_table("dnp3"))).unwrap();
    assert_eq!(table.num_rows(), 1);
    assert_eq!(table.column("0"), Some(&[15.0][..]));
}

#[test]
fn test_running_capture_is_not_started_again() {
    let ws = Workspace::new();
    let tools = Arc::new(FakeTools::new());
    let orchestrator = ws.orchestrator(tools.clone());
    let capture = ws.capture("plant1");

    let dir = orchestrator.output_dir(&capture);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(CREATED_MARKER), "").unwrap();

    let err = orchestrator.run(&capture).unwrap_err();
    assert!(matches!(err, Error::Status(StatusError::AlreadyRunning { .. })));
    assert!(tools.calls().is_empty());
    assert_eq!(orchestrator.status(&capture), TaskStatus::Running);
}

#[test]
fn test_missing_capture_file_leaves_status_new() {
    let ws = Workspace::new();
    let tools = Arc::new(FakeTools::new());
    let orchestrator = ws.orchestrator(tools.clone());
    let capture = tpahelper::capture::Capture::new(ws.dir.path().join("ghost.pcap"));

    assert!(matches!(orchestrator.run(&capture), Err(Error::Io(_))));
    assert!(tools.calls().is_empty());
    assert_eq!(orchestrator.status(&capture), TaskStatus::New);
}

#[test]
fn test_artifacts_listed_before_run() {
    let ws = Workspace::new();
    let orchestrator = ws.orchestrator(Arc::new(FakeTools::new()));
    let capture = ws.capture("plant1");

    let artifacts = orchestrator.artifacts(&capture);
    let stages: Vec<&str> = artifacts.iter().map(|a| a.stage.as_str()).collect();
    assert_eq!(
        stages,
        vec![
            "capinfos",
            "protocol_hierarchy",
            "ndpi",
            "ndpi",
            "strings",
            "dnp3_filter",
            "dnp3_dump",
            "dnp3_values",
            "dnp3_values",
        ]
    );
    assert!(artifacts.iter().all(|a| !a.exists));
    assert!(artifacts
        .iter()
        .all(|a| a.path.starts_with(orchestrator.output_dir(&capture))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_many_isolates_captures() {
    let ws = Workspace::new();
    let tools = Arc::new(FakeTools::new().failing(|inv| mentions(inv, "broken.pcap")));
    let orchestrator = ws.orchestrator(tools.clone());

    let captures = vec![ws.capture("north"), ws.capture("broken"), ws.capture("south")];
    let results = orchestrator.run_many(captures, 2).await;

    let names: Vec<&str> = results.iter().map(|(c, _)| c.name()).collect();
    assert_eq!(names, vec!["north", "broken", "south"]);

    assert_eq!(*results[0].1.as_ref().unwrap(), RunOutcome::Completed);
    assert!(results[1].1.is_err());
    assert_eq!(*results[2].1.as_ref().unwrap(), RunOutcome::Completed);

    assert_eq!(orchestrator.status(&results[0].0), TaskStatus::Done);
    assert_eq!(orchestrator.status(&results[1].0), TaskStatus::Failed);
    assert_eq!(orchestrator.status(&results[2].0), TaskStatus::Done);

    // Each capture writes only inside its own directory.
    let root = ws.output_root();
    let mut dirs: Vec<String> = fs::read_dir(&root)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    dirs.sort();
    assert_eq!(dirs, vec!["broken", "north", "south"]);
}
