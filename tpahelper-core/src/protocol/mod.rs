//! Protocol point-value processors.
//!
//! This module provides:
//! - [`PointProcessor`] trait describing where a protocol keeps its points
//! - [`PointExtractor`] which turns one decoded packet into [`PointValue`]s
//! - [`ProcessorRegistry`] for managing registered processors
//!
//! ## Supported Protocols
//!
//! | Protocol | Targets | Fine timestamp |
//! |----------|---------|----------------|
//! | DNP3 | analog input / analog output × int, double, float | `dnp3.al.timestamp` |
//!
//! ## Example
//!
//! ```rust
//! use tpahelper_core::protocol::{default_registry, PointProcessor};
//! use tpahelper_core::tree::Node;
//!
//! let registry = default_registry();
//! let dnp3 = registry.get("dnp3").unwrap();
//!
//! let packet: Node = serde_json::from_str(r#"{"_source": {"layers": {
//!     "frame": {"frame.time": "Jan  1, 2024 00:00:00.000000000 UTC"},
//!     "dnp3": {"dnp3.al.index": "4", "dnp3.al.ana.int": "120"}
//! }}}"#).unwrap();
//!
//! let points = dnp3.extract(&packet);
//! assert_eq!(points.len(), 1);
//! assert_eq!(points[0].index, "4");
//! ```

mod dnp3;
mod extractor;
mod point;
mod registry;

pub use dnp3::Dnp3Processor;
pub use extractor::{ExtractStats, PacketOutcome, PointExtractor};
pub use point::PointValue;
pub use registry::{BuiltinProcessor, ProcessorRegistry};

use crate::tree::Node;

/// Capture timestamp of the frame, as the decoder prints it.
pub const FRAME_TIME: &str = "frame.time";

/// Capture timestamp of the frame in UTC.
pub const FRAME_TIME_UTC: &str = "frame.time_utc";

/// Frame and addressing fields every point dump carries.
pub const FRAME_FIELDS: &[&str] = &[FRAME_TIME, FRAME_TIME_UTC, "ip.src", "ip.dst"];

/// Describes where a protocol keeps its point values in a decoded packet.
pub trait PointProcessor: Send + Sync {
    /// Unique identifier (e.g., "dnp3"). Used in artifact and stage names.
    fn name(&self) -> &'static str;

    /// Human-readable display name.
    fn display_name(&self) -> &'static str {
        self.name()
    }

    /// Value fields to extract, in extraction order.
    fn target_fields(&self) -> &'static [&'static str];

    /// Protocol-embedded timestamp, if the protocol has one.
    fn fine_timestamp_field(&self) -> Option<&'static str> {
        None
    }

    /// Field holding the point index.
    fn index_field(&self) -> &'static str;

    /// Display filter selecting this protocol's packets.
    fn dissector_filter(&self) -> &'static str {
        self.name()
    }

    /// Protocol fields the decoder must keep in its dump.
    fn decoder_fields(&self) -> Vec<&'static str> {
        let mut fields = vec![self.index_field()];
        fields.extend(self.fine_timestamp_field());
        fields.extend_from_slice(self.target_fields());
        fields
    }

    /// Decoder arguments producing the JSON dump, minus the input file.
    fn decoder_args(&self) -> Vec<String> {
        let layers = format!("frame ip {}", self.dissector_filter());
        let fields = FRAME_FIELDS
            .iter()
            .copied()
            .chain(self.decoder_fields())
            .collect::<Vec<_>>()
            .join(" ");
        vec![
            "-T".to_string(),
            "json".to_string(),
            "-J".to_string(),
            layers,
            "-j".to_string(),
            fields,
        ]
    }

    /// Compiled searches for this processor.
    fn extractor(&self) -> PointExtractor {
        PointExtractor::new(self)
    }

    /// Point values in one packet.
    fn extract(&self, packet: &Node) -> Vec<PointValue> {
        self.extractor().extract(packet)
    }

    /// Point values in one packet, only if `filter_field` occurs in it.
    fn extract_filtered(&self, packet: &Node, filter_field: &str) -> Vec<PointValue> {
        self.extractor().with_filter(filter_field).extract(packet)
    }
}

/// Create a registry with all built-in processors.
pub fn default_registry() -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();
    registry.register(Dnp3Processor);
    registry
}
