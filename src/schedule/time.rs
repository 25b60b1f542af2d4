//! Time-of-day parsing and formatting for schedule hours.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;

use super::error::EngineError;

pub const MINUTES_PER_DAY: u64 = 24 * 60;

/// Rendered in place of a time that cannot be read.
pub const INVALID_TIME: &str = "Invalid Time";

/// `00:00` through `23:59`, nothing else.
static HH_MM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").unwrap());

/// Parse a strict `HH:MM` schedule hour.
pub fn parse_hh_mm(field: &str, value: &str) -> Result<NaiveTime, EngineError> {
    let caps = HH_MM.captures(value).ok_or_else(|| {
        EngineError::Validation(format!(
            "{field} must be in HH:MM format (00:00 to 23:59), got {value:?}"
        ))
    })?;
    let hour: u32 = caps[1].parse().unwrap_or_default();
    let minute: u32 = caps[2].parse().unwrap_or_default();
    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| EngineError::Validation(format!("{field} is out of range: {value:?}")))
}

/// Minutes available between `start` and `end`, wrapping past midnight
/// when `end` is earlier than `start`.
pub fn window_minutes(start: NaiveTime, end: NaiveTime) -> u64 {
    let start = minute_of_day(start);
    let end = minute_of_day(end);
    if end >= start {
        end - start
    } else {
        MINUTES_PER_DAY - start + end
    }
}

fn minute_of_day(t: NaiveTime) -> u64 {
    u64::from(t.hour()) * 60 + u64::from(t.minute())
}

/// Render any stored time representation as zero-padded `HH:MM`.
/// Falls back to [`INVALID_TIME`] instead of failing.
pub fn format_time_string(input: &str) -> String {
    match parse_loose(input.trim()) {
        Some(t) => t.format("%H:%M").to_string(),
        None => INVALID_TIME.to_string(),
    }
}

fn parse_loose(input: &str) -> Option<NaiveTime> {
    if input.is_empty() {
        return None;
    }
    for fmt in ["%H:%M", "%H:%M:%S", "%H:%M:%S%.f"] {
        if let Ok(t) = NaiveTime::parse_from_str(input, fmt) {
            return Some(t);
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, fmt) {
            return Some(dt.time());
        }
    }
    DateTime::parse_from_rfc3339(input).ok().map(|dt| dt.time())
}
