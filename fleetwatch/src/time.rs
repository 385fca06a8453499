//! Time utilities for telemetry timestamps

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Parses a device timestamp into UTC.
///
/// Accepts RFC 3339 (with or without fractional seconds, any offset) and the
/// zone-less `YYYY-MM-DD HH:MM:SS` form some trackers emit, which is taken
/// as UTC. Returns None for anything else.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();

    if let Ok(stamped) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(stamped.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    None
}

/// Signed seconds from `earlier` to `later`, with millisecond resolution.
#[inline]
pub fn seconds_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / 1000.0
}
