//! Extracted point-value records.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// One point measurement pulled out of one packet.
///
/// Every field keeps the decoder's text; numeric coercion happens during
/// assembly, where non-numeric values are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointValue {
    /// Target field the value came from (e.g. `dnp3.al.ana.int`).
    pub kind: CompactString,
    /// First `frame.time` in the packet.
    pub frame_time: Option<CompactString>,
    /// First `frame.time_utc` in the packet.
    pub frame_time_utc: Option<CompactString>,
    /// Protocol-embedded timestamp, `None` for degraded records.
    pub fine_time: Option<CompactString>,
    /// Point index.
    pub index: CompactString,
    /// Raw value.
    pub value: CompactString,
}

impl PointValue {
    /// Whether this record was produced without a fine timestamp.
    pub fn is_degraded(&self) -> bool {
        self.fine_time.is_none()
    }

    /// Value coerced to a float, `None` unless it is a finite number.
    ///
    /// `inf` and `NaN` count as non-numeric.
    pub fn numeric_value(&self) -> Option<f64> {
        self.value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
    }
}
