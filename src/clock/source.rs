//! Clock abstraction and the fixed display offset.

use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};

/// Offset of the ingestion system's wall clock (WIB, UTC+7), in seconds.
pub const WIB_OFFSET_SECS: i32 = 7 * 3600;

pub const MILLIS_PER_MINUTE: i64 = 60 * 1000;
pub const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;

/// The UTC+7 display offset.
pub fn wib_offset() -> FixedOffset {
    FixedOffset::east_opt(WIB_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Supplies "now" as epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;

    /// "now" in the UTC+7 display offset.
    fn now_wib(&self) -> DateTime<FixedOffset> {
        millis_to_wib(self.now_millis()).unwrap_or_else(|| Utc::now().with_timezone(&wib_offset()))
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Frozen clock for tests and replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    millis: i64,
}

impl FixedClock {
    pub fn at_millis(millis: i64) -> Self {
        Self { millis }
    }

    pub fn at(instant: DateTime<Utc>) -> Self {
        Self::at_millis(instant.timestamp_millis())
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.millis
    }
}

/// Convert epoch milliseconds to a UTC+7 datetime, `None` if out of range.
pub fn millis_to_wib(millis: i64) -> Option<DateTime<FixedOffset>> {
    wib_offset().timestamp_millis_opt(millis).single()
}

/// Format epoch milliseconds the way reports show them (`dd-mm-YYYY HH:MM`).
pub fn format_wib(millis: i64) -> Option<String> {
    millis_to_wib(millis).map(|dt| dt.format("%d-%m-%Y %H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_is_frozen() {
        let clock = FixedClock::at_millis(1_700_000_000_000);
        assert_eq!(clock.now_millis(), clock.now_millis());
    }

    #[test]
    fn test_wib_offset_is_seven_hours() {
        assert_eq!(wib_offset().local_minus_utc(), 25_200);
    }

    #[test]
    fn test_format_wib_shifts_from_utc() {
        // 2026-01-29T00:00:00Z is 07:00 in UTC+7
        let instant = Utc.with_ymd_and_hms(2026, 1, 29, 0, 0, 0).unwrap();
        let formatted = format_wib(instant.timestamp_millis()).unwrap();
        assert_eq!(formatted, "29-01-2026 07:00");
    }

    #[test]
    fn test_now_wib_matches_fixed_clock() {
        let instant = Utc.with_ymd_and_hms(2026, 3, 1, 17, 30, 0).unwrap();
        let clock = FixedClock::at(instant);
        assert_eq!(clock.now_wib().timestamp_millis(), instant.timestamp_millis());
        assert_eq!(clock.now_wib().format("%H:%M").to_string(), "00:30");
    }
}
