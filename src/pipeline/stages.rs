//! Default stage catalogue.
//!
//! | Stage | Tool | Artifacts |
//! |-------|------|-----------|
//! | `capinfos` | capture info | `capinfos.txt` |
//! | `protocol_hierarchy` | decoder | `protocol_hierarchy.txt` |
//! | `ndpi` | DPI summarizer | `ndpi_summary.txt`, `ndpi_flows.json` |
//! | `strings` | string extraction | `protocols/strings/strings.txt` |
//! | `<p>_filter` | decoder | `protocols/pcaps/<p>.pcap` |
//! | `<p>_dump` | decoder | `protocols/values/target_<p>.json` |
//! | `<p>_values` | built in | `protocols/values/<p>_point_values.parquet`, `protocols/values/<p>_point_value_charts.html` |
//!
//! The last three repeat for every registered point processor `<p>`.

use std::path::PathBuf;

use tpahelper_core::protocol::{PointProcessor, ProcessorRegistry};

use super::{Arg, Stage, StageRegistry, ToolSpec};
use crate::error::PipelineError;
use crate::tool::ToolKind;

pub const CAPINFOS_TXT: &str = "capinfos.txt";
pub const PROTOCOL_HIERARCHY_TXT: &str = "protocol_hierarchy.txt";
pub const NDPI_SUMMARY_TXT: &str = "ndpi_summary.txt";
pub const NDPI_FLOWS_JSON: &str = "ndpi_flows.json";
pub const STRINGS_TXT: &str = "protocols/strings/strings.txt";

const PCAPS_DIR: &str = "protocols/pcaps";
const VALUES_DIR: &str = "protocols/values";

/// Filtered sub-capture holding only `protocol`'s packets.
pub fn filtered_capture(protocol: &str) -> PathBuf {
    PathBuf::from(PCAPS_DIR).join(format!("{protocol}.pcap"))
}

/// Decoder JSON dump of the filtered sub-capture.
pub fn packet_dump(protocol: &str) -> PathBuf {
    PathBuf::from(VALUES_DIR).join(format!("target_{protocol}.json"))
}

/// Point-value table.
pub fn point_values_table(protocol: &str) -> PathBuf {
    PathBuf::from(VALUES_DIR).join(format!("{protocol}_point_values.parquet"))
}

/// Companion report for the point-value table.
pub fn point_values_report(protocol: &str) -> PathBuf {
    PathBuf::from(VALUES_DIR).join(format!("{protocol}_point_value_charts.html"))
}

/// Stage catalogue for `processors`, in declaration order.
pub fn default_stages(processors: &ProcessorRegistry) -> Result<StageRegistry, PipelineError> {
    let mut registry = StageRegistry::new();

    registry.register(Stage::tool(
        "capinfos",
        ToolSpec::new(ToolKind::CaptureInfo)
            .literals(["-TmQ"])
            .arg(Arg::Capture)
            .stdout_to(CAPINFOS_TXT),
    ))?;

    registry.register(Stage::tool(
        "protocol_hierarchy",
        ToolSpec::new(ToolKind::Decoder)
            .literals(["-r"])
            .arg(Arg::Capture)
            .literals(["-q", "-z", "io,phs"])
            .stdout_to(PROTOCOL_HIERARCHY_TXT),
    ))?;

    registry.register(
        Stage::tool(
            "ndpi",
            ToolSpec::new(ToolKind::Dpi)
                .literals(["-i"])
                .arg(Arg::Capture)
                .literals(["-K", "json", "-k"])
                .arg(Arg::artifact(NDPI_FLOWS_JSON))
                .stdout_to(NDPI_SUMMARY_TXT),
        )
        .produces(NDPI_FLOWS_JSON),
    )?;

    registry.register(Stage::tool(
        "strings",
        ToolSpec::new(ToolKind::Strings)
            .arg(Arg::Capture)
            .literals(["-q"])
            .stdout_to(STRINGS_TXT),
    ))?;

    for processor in processors.all() {
        let name = processor.name();
        let filter = format!("{name}_filter");
        let dump = format!("{name}_dump");

        registry.register(
            Stage::tool(
                filter.clone(),
                ToolSpec::new(ToolKind::Decoder)
                    .literals(["-r"])
                    .arg(Arg::Capture)
                    .literals(["-w"])
                    .arg(Arg::artifact(filtered_capture(name)))
                    .literals(["-Y", processor.dissector_filter()]),
            )
            .produces(filtered_capture(name)),
        )?;

        registry.register(
            Stage::tool(
                dump.clone(),
                ToolSpec::new(ToolKind::Decoder)
                    .literals(["-r"])
                    .arg(Arg::artifact(filtered_capture(name)))
                    .literals(processor.decoder_args())
                    .stdout_to(packet_dump(name)),
            )
            .depends_on(filter),
        )?;

        registry.register(
            Stage::point_values(
                format!("{name}_values"),
                *processor,
                packet_dump(name),
                point_values_table(name),
                point_values_report(name),
            )
            .depends_on(dump),
        )?;
    }

    Ok(registry)
}
