//! Freshness status and per-stream result.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Freshness bucket of one stream.
///
/// The first four variants are ordered by staleness. `NoData` and `Error`
/// are diagnostic states and only compare equal to themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FreshnessStatus {
    VeryFresh,
    Fresh,
    Moderate,
    Stale,
    NoData,
    Error,
}

impl FreshnessStatus {
    /// Display order of report groups.
    pub const ALL: [FreshnessStatus; 6] = [
        FreshnessStatus::VeryFresh,
        FreshnessStatus::Fresh,
        FreshnessStatus::Moderate,
        FreshnessStatus::Stale,
        FreshnessStatus::NoData,
        FreshnessStatus::Error,
    ];

    fn staleness_rank(&self) -> Option<u8> {
        match self {
            FreshnessStatus::VeryFresh => Some(0),
            FreshnessStatus::Fresh => Some(1),
            FreshnessStatus::Moderate => Some(2),
            FreshnessStatus::Stale => Some(3),
            FreshnessStatus::NoData | FreshnessStatus::Error => None,
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, FreshnessStatus::VeryFresh | FreshnessStatus::Fresh)
    }

    pub fn requires_attention(&self) -> bool {
        matches!(
            self,
            FreshnessStatus::Stale | FreshnessStatus::NoData | FreshnessStatus::Error
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FreshnessStatus::VeryFresh => "VERY_FRESH",
            FreshnessStatus::Fresh => "FRESH",
            FreshnessStatus::Moderate => "MODERATE",
            FreshnessStatus::Stale => "STALE",
            FreshnessStatus::NoData => "NO_DATA",
            FreshnessStatus::Error => "ERROR",
        }
    }

    /// Human label used in report headings.
    pub fn label(&self) -> &'static str {
        match self {
            FreshnessStatus::VeryFresh => "VERY FRESH",
            FreshnessStatus::Fresh => "FRESH",
            FreshnessStatus::Moderate => "MODERATE",
            FreshnessStatus::Stale => "STALE",
            FreshnessStatus::NoData => "NO DATA",
            FreshnessStatus::Error => "ERROR",
        }
    }
}

impl PartialOrd for FreshnessStatus {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }
        match (self.staleness_rank(), other.staleness_rank()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => None,
        }
    }
}

impl fmt::Display for FreshnessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time freshness of one stream, rebuilt every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreshnessResult {
    pub stream_name: String,
    pub status: FreshnessStatus,
    pub total_records: u64,
    /// Epoch milliseconds.
    pub latest_timestamp: Option<i64>,
    pub earliest_timestamp: Option<i64>,
    /// `latest_timestamp` as `dd-mm-YYYY HH:MM` in UTC+7.
    pub latest_datetime: Option<String>,
    pub hours_since_latest: Option<f64>,
    pub records_this_cycle: u64,
    pub avg_records_per_hour: Option<f64>,
    /// Empty hourly buckets in the trailing 24h, 0 = most recent hour.
    pub gap_hours: Vec<u8>,
    pub cycle_duration_minutes: Option<f64>,
    pub error_message: Option<String>,
    pub recommendations: Vec<String>,
}

impl FreshnessResult {
    fn empty(stream_name: &str, status: FreshnessStatus) -> Self {
        Self {
            stream_name: stream_name.to_string(),
            status,
            total_records: 0,
            latest_timestamp: None,
            earliest_timestamp: None,
            latest_datetime: None,
            hours_since_latest: None,
            records_this_cycle: 0,
            avg_records_per_hour: None,
            gap_hours: Vec::new(),
            cycle_duration_minutes: None,
            error_message: None,
            recommendations: Vec::new(),
        }
    }

    /// `ERROR` result carrying `message`.
    pub fn error(stream_name: &str, message: impl Into<String>) -> Self {
        let mut result = Self::empty(stream_name, FreshnessStatus::Error);
        result.error_message = Some(message.into());
        result.recommendations = super::recommendations::generate_recommendations(&result);
        result
    }

    /// `NO_DATA` result for a table without rows.
    pub fn no_data(stream_name: &str) -> Self {
        let mut result = Self::empty(stream_name, FreshnessStatus::NoData);
        result.avg_records_per_hour = Some(0.0);
        result.recommendations = super::recommendations::generate_recommendations(&result);
        result
    }

    /// Number of empty hourly buckets.
    pub fn gap_count(&self) -> usize {
        self.gap_hours.len()
    }
}
