//! Per-packet point-value extraction.

use compact_str::CompactString;
use tracing::debug;

use super::{PointProcessor, PointValue, FRAME_TIME, FRAME_TIME_UTC};
use crate::tree::{Node, TreeMatcher};

/// Compiled field searches for one processor.
///
/// Every search is a `**/<field>` match, so the layout of the decoder's
/// layer tree does not matter. Searches over the same packet line up
/// positionally, which is what makes the index/value zip meaningful.
#[derive(Debug, Clone)]
pub struct PointExtractor {
    frame_time: TreeMatcher,
    frame_time_utc: TreeMatcher,
    fine_time: Option<TreeMatcher>,
    index: TreeMatcher,
    targets: Vec<(CompactString, TreeMatcher)>,
    filter: Option<TreeMatcher>,
}

/// What one packet contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketOutcome {
    /// Records appended.
    pub records: usize,
    /// Records appended without a fine timestamp.
    pub degraded: usize,
    /// Target fields present but dropped because index and value counts differ.
    pub skipped_fields: usize,
}

/// Running totals across a dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub packets: u64,
    pub records: u64,
    pub degraded: u64,
    pub skipped_fields: u64,
}

impl ExtractStats {
    pub fn add(&mut self, outcome: PacketOutcome) {
        self.packets += 1;
        self.records += outcome.records as u64;
        self.degraded += outcome.degraded as u64;
        self.skipped_fields += outcome.skipped_fields as u64;
    }
}

impl PointExtractor {
    /// Build the searches a processor needs.
    pub fn new<P: PointProcessor + ?Sized>(processor: &P) -> Self {
        Self {
            frame_time: TreeMatcher::field(FRAME_TIME),
            frame_time_utc: TreeMatcher::field(FRAME_TIME_UTC),
            fine_time: processor.fine_timestamp_field().map(TreeMatcher::field),
            index: TreeMatcher::field(processor.index_field()),
            targets: processor
                .target_fields()
                .iter()
                .map(|f| (CompactString::new(f), TreeMatcher::field(f)))
                .collect(),
            filter: None,
        }
    }

    /// Only emit records for packets that contain `field` somewhere.
    pub fn with_filter(mut self, field: &str) -> Self {
        self.filter = Some(TreeMatcher::field(field));
        self
    }

    /// Records from one packet, in target-field order.
    pub fn extract(&self, packet: &Node) -> Vec<PointValue> {
        let mut out = Vec::new();
        self.extract_into(packet, &mut out);
        out
    }

    /// Append records from one packet to `out`.
    ///
    /// For each target field:
    /// - fine timestamp, index and value counts all equal: zip all three
    /// - index and value counts equal: zip with no fine timestamp
    /// - otherwise the field contributes nothing for this packet
    pub fn extract_into(&self, packet: &Node, out: &mut Vec<PointValue>) -> PacketOutcome {
        let mut outcome = PacketOutcome::default();

        if let Some(filter) = &self.filter {
            if filter.count(packet) == 0 {
                return outcome;
            }
        }

        let found: Vec<(&CompactString, Vec<&Node>)> = self
            .targets
            .iter()
            .map(|(name, matcher)| (name, matcher.values(packet)))
            .filter(|(_, values)| !values.is_empty())
            .collect();
        if found.is_empty() {
            return outcome;
        }

        let frame_time = self.frame_time.first(packet).and_then(text);
        let frame_time_utc = self.frame_time_utc.first(packet).and_then(text);
        let fine_times: Vec<Option<CompactString>> = match &self.fine_time {
            Some(matcher) => matcher.values(packet).into_iter().map(text).collect(),
            None => Vec::new(),
        };
        let indices: Vec<CompactString> = self
            .index
            .values(packet)
            .into_iter()
            .map(|n| text(n).unwrap_or_default())
            .collect();

        for (kind, values) in found {
            if indices.len() != values.len() {
                debug!(
                    field = %kind,
                    indices = indices.len(),
                    values = values.len(),
                    "index/value count mismatch, skipping field"
                );
                outcome.skipped_fields += 1;
                continue;
            }

            let with_fine = fine_times.len() == values.len();
            for (i, (index, value)) in indices.iter().zip(&values).enumerate() {
                let fine_time = if with_fine { fine_times[i].clone() } else { None };
                if fine_time.is_none() {
                    outcome.degraded += 1;
                }
                out.push(PointValue {
                    kind: kind.clone(),
                    frame_time: frame_time.clone(),
                    frame_time_utc: frame_time_utc.clone(),
                    fine_time,
                    index: index.clone(),
                    value: text(value).unwrap_or_default(),
                });
                outcome.records += 1;
            }
        }

        outcome
    }
}

fn text(node: &Node) -> Option<CompactString> {
    node.as_text().map(CompactString::from)
}
