//! Time constants and the wall clock.
//!
//! Timestamps are microseconds since the Unix epoch (UTC) stored as `u64`.

use chrono::{DateTime, Utc};

pub const MICROS_PER_MILLI: u64 = 1_000;
pub const MICROS_PER_SECOND: u64 = 1_000 * MICROS_PER_MILLI;
pub const MICROS_PER_MINUTE: u64 = 60 * MICROS_PER_SECOND;
pub const MICROS_PER_HOUR: u64 = 60 * MICROS_PER_MINUTE;
pub const MICROS_PER_DAY: u64 = 24 * MICROS_PER_HOUR;
pub const MICROS_PER_WEEK: u64 = 7 * MICROS_PER_DAY;
/// Fixed-length month. Not calendar aware.
pub const MICROS_PER_MONTH: u64 = 30 * MICROS_PER_DAY;
/// Fixed-length year. Not calendar aware.
pub const MICROS_PER_YEAR: u64 = 365 * MICROS_PER_DAY;

/// A source of the current time.
///
/// Queries read "now" through the clock attached to their transaction so tests
/// can pin it.
pub trait Clock: Send + Sync {
    /// Current time in microseconds since the epoch.
    fn unix_micros(&self) -> u64;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_micros(&self) -> u64 {
        // Before 1970 the clock is broken anyway; clamp instead of wrapping.
        u64::try_from(Utc::now().timestamp_micros()).unwrap_or(0)
    }
}

/// A clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn unix_micros(&self) -> u64 {
        self.0
    }
}

/// Formats a timestamp as `YYYY-MM-DD HH:MM:SS[.ffffff]` in UTC.
///
/// Values outside chrono's representable range fall back to the raw
/// microsecond count.
pub fn format_timestamp(micros: u64) -> String {
    let datetime = i64::try_from(micros)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_micros);

    match datetime {
        Some(dt) if micros % MICROS_PER_SECOND == 0 => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        None => micros.to_string(),
    }
}
