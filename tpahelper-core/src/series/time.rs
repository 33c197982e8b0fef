//! Frame timestamp parsing.
//!
//! The decoder prints `frame.time` as `Jan  1, 2024 00:00:00.250000000 UTC`
//! (double space before single-digit days, nanosecond fraction, zone
//! abbreviation). Newer decoders print `frame.time_utc` as RFC 3339.

use chrono::{DateTime, NaiveDateTime};

use crate::protocol::PointValue;

const DECODER_FORMAT: &str = "%b %d, %Y %H:%M:%S%.f";

/// Parse a frame timestamp to microseconds since the Unix epoch (UTC).
///
/// Accepts RFC 3339, the decoder's `frame.time` form (zone abbreviation
/// read as UTC) and plain epoch seconds.
pub fn parse_frame_time(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_micros());
    }

    if let Some(micros) = parse_decoder_time(raw) {
        return Some(micros);
    }

    raw.parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite())
        .and_then(epoch_micros)
}

/// Epoch seconds to microseconds, if the instant is representable.
fn epoch_micros(secs: f64) -> Option<i64> {
    let micros = (secs * 1_000_000.0).round();
    if micros < i64::MIN as f64 || micros >= i64::MAX as f64 {
        return None;
    }
    let micros = micros as i64;
    DateTime::from_timestamp_micros(micros).map(|_| micros)
}

fn parse_decoder_time(raw: &str) -> Option<i64> {
    let mut parts: Vec<&str> = raw.split_whitespace().collect();
    if parts
        .last()
        .is_some_and(|zone| zone.chars().all(|c| c.is_ascii_alphabetic()))
    {
        parts.pop();
    }
    let normalized = parts.join(" ");
    NaiveDateTime::parse_from_str(&normalized, DECODER_FORMAT)
        .ok()
        .map(|dt| dt.and_utc().timestamp_micros())
}

/// Time of a record on the frame axis: `frame.time`, else `frame.time_utc`.
pub fn record_time(point: &PointValue) -> Option<i64> {
    point
        .frame_time
        .as_deref()
        .and_then(parse_frame_time)
        .or_else(|| point.frame_time_utc.as_deref().and_then(parse_frame_time))
}
