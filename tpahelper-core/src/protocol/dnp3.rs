//! DNP3 point values.
//!
//! Analog input and analog output objects carry their value under a
//! type-specific field (`dnp3.al.ana.int`, `dnp3.al.anaout.float`, ...) next
//! to the point index. Objects with time carry `dnp3.al.timestamp`.

use super::PointProcessor;

/// Analog input / analog output value fields.
const TARGETS: &[&str] = &[
    "dnp3.al.ana.int",
    "dnp3.al.ana.double",
    "dnp3.al.ana.float",
    "dnp3.al.anaout.int",
    "dnp3.al.anaout.double",
    "dnp3.al.anaout.float",
];

/// DNP3 point processor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dnp3Processor;

impl PointProcessor for Dnp3Processor {
    fn name(&self) -> &'static str {
        "dnp3"
    }

    fn display_name(&self) -> &'static str {
        "DNP3"
    }

    fn target_fields(&self) -> &'static [&'static str] {
        TARGETS
    }

    fn fine_timestamp_field(&self) -> Option<&'static str> {
        Some("dnp3.al.timestamp")
    }

    fn index_field(&self) -> &'static str {
        "dnp3.al.index"
    }
}
