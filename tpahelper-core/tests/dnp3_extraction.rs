//! Integration tests for DNP3 point-value extraction.
//!
//! Drives a decoder-shaped JSON dump through the reader, extractor,
//! assembler and Parquet writer.

use std::fs;
use std::io::Write;

use tempfile::TempDir;
use tpahelper_core::prelude::*;
use tpahelper_core::series::render_report;

/// One packet in the decoder's `-T json` layout.
///
/// `points` is a list of (index, value, fine timestamp).
fn dnp3_packet(frame_time: &str, target: &str, points: &[(&str, &str, Option<&str>)]) -> String {
    let objects: Vec<String> = points
        .iter()
        .enumerate()
        .map(|(i, (index, value, ts))| {
            let ts = ts
                .map(|t| format!(r#""dnp3.al.timestamp": "{t}", "#))
                .unwrap_or_default();
            format!(
                r#""Point Number {i}": {{"dnp3.al.index": "{index}", {ts}"{target}": "{value}"}}"#
            )
        })
        .collect();

    format!(
        r#"{{
  "_index": "packets-2024-01-01",
  "_type": "doc",
  "_score": null,
  "_source": {{
    "layers": {{
      "frame": {{"frame.time": "{frame_time}", "frame.time_utc": "{frame_time}"}},
      "ip": {{"ip.src": "192.168.10.5", "ip.dst": "192.168.10.20"}},
      "dnp3": {{
        "Application Layer": {{
          "RESPONSE Data Objects": {{ {} }}
        }}
      }}
    }}
  }}
}}"#,
        objects.join(", ")
    )
}

fn write_dump(dir: &TempDir, packets: &[String]) -> std::path::PathBuf {
    let path = dir.path().join("target_dnp3.json");
    let mut file = fs::File::create(&path).unwrap();
    write!(file, "[\n{}\n]\n", packets.join(",\n")).unwrap();
    path
}

#[test]
fn test_full_extraction_to_parquet() {
    let dir = TempDir::new().unwrap();
    let dump = write_dump(
        &dir,
        &[
            dnp3_packet(
                "Mar  5, 2024 10:00:00.100000000 UTC",
                "dnp3.al.ana.int",
                &[("0", "10", Some("t")), ("1", "20", Some("t"))],
            ),
            dnp3_packet(
                "Mar  5, 2024 10:00:00.600000000 UTC",
                "dnp3.al.ana.int",
                &[("0", "30", None), ("1", "40", None)],
            ),
            dnp3_packet(
                "Mar  5, 2024 10:00:02.000000000 UTC",
                "dnp3.al.anaout.float",
                &[("1", "2.5", None)],
            ),
        ],
    );

    let registry = default_registry();
    let dnp3 = registry.get("dnp3").unwrap();
    let mut reader = PacketDumpReader::open(&dump).unwrap();
    let run = extract_table(&mut reader, dnp3).unwrap();

    assert!(run.truncated.is_none());
    assert_eq!(run.extract.packets, 3);
    assert_eq!(run.extract.records, 5);
    assert_eq!(run.extract.degraded, 3);

    let table = &run.table;
    assert_eq!(table.num_rows(), 2);
    assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["0", "1"]);
    assert_eq!(table.column("0"), Some(&[20.0, 0.0][..]));
    assert_eq!(table.column("1"), Some(&[30.0, 2.5][..]));
    assert_eq!(table.times()[1] - table.times()[0], 2_000_000);

    let parquet = dir.path().join("dnp3_point_values.parquet");
    write_parquet(table, &parquet).unwrap();
    let back = read_parquet(&parquet).unwrap();
    assert_eq!(back.times(), table.times());
    assert_eq!(back.column("1"), table.column("1"));

    let html = render_report(table, dnp3.display_name());
    assert!(html.contains("<th>0</th><th>1</th>"));
}

#[test]
fn test_dump_without_points_gives_empty_table() {
    let dir = TempDir::new().unwrap();
    let dump = write_dump(
        &dir,
        &[r#"{"_source": {"layers": {"frame": {"frame.time": "Mar  5, 2024 10:00:00.1 UTC"}}}}"#
            .to_string()],
    );

    let registry = default_registry();
    let dnp3 = registry.get("dnp3").unwrap();
    let mut reader = PacketDumpReader::open(&dump).unwrap();
    let run = extract_table(&mut reader, dnp3).unwrap();

    assert!(run.table.is_empty());

    let parquet = dir.path().join("empty.parquet");
    write_parquet(&run.table, &parquet).unwrap();
    assert!(read_parquet(&parquet).unwrap().is_empty());
    assert_eq!(
        render_report(&run.table, dnp3.display_name()),
        "<h1>No DNP3 point values.</h1>"
    );
}

#[test]
fn test_jsonl_dump() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("target_dnp3.jsonl");
    let lines: Vec<String> = (0..4)
        .map(|i| {
            dnp3_packet(
                &format!("2024-03-05T10:00:0{i}Z"),
                "dnp3.al.ana.double",
                &[("7", format!("{}", i * 2).as_str(), None)],
            )
            .replace('\n', "")
        })
        .collect();
    fs::write(&path, lines.join("\n")).unwrap();

    let mut reader = PacketDumpReader::open(&path).unwrap();
    let run = extract_table(&mut reader, &tpahelper_core::Dnp3Processor).unwrap();

    assert_eq!(run.table.num_rows(), 4);
    assert_eq!(run.table.column("7"), Some(&[0.0, 2.0, 4.0, 6.0][..]));
}
