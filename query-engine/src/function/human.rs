//! Lenient parsing of human-written absolute times.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses `text` to microseconds since the epoch.
///
/// Accepts plain unix timestamps (seconds, milliseconds or microseconds,
/// picked by magnitude), RFC 3339, `YYYY-MM-DD HH:MM[:SS[.f]]` (space or `T`)
/// and bare dates. Times without an offset are UTC. Instants before the epoch
/// are rejected.
pub fn parse_time(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.bytes().all(|b| b.is_ascii_digit()) {
        return parse_unix_timestamp(text);
    }

    let micros = if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        dt.timestamp_micros()
    } else if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        dt.and_utc().timestamp_micros()
    } else {
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?
            .and_utc()
            .timestamp_micros()
    };

    u64::try_from(micros).ok()
}

fn parse_unix_timestamp(digits: &str) -> Option<u64> {
    let value: u64 = digits.parse().ok()?;
    match value {
        v if v < 100_000_000_000 => v.checked_mul(1_000_000),
        v if v < 100_000_000_000_000 => v.checked_mul(1_000),
        v => Some(v),
    }
}
