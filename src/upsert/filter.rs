//! No-signal pre-filter.
//!
//! Some endpoints return placeholder rows whose every value is zero. They
//! are counted as filtered and never reach the writer.

use crate::upsert::row::UpsertRow;

/// Which rows are dropped before the write attempt.
pub enum PreFilter<R> {
    KeepAll,
    /// Drop rows whose signal values are all zero or missing.
    DropAllZero,
    /// Drop rows for which the predicate returns true.
    Custom(Box<dyn Fn(&R) -> bool + Send + Sync>),
}

impl<R> Default for PreFilter<R> {
    fn default() -> Self {
        PreFilter::KeepAll
    }
}

impl<R: UpsertRow> PreFilter<R> {
    /// True if the row must be dropped.
    pub fn drops(&self, row: &R) -> bool {
        match self {
            PreFilter::KeepAll => false,
            PreFilter::DropAllZero => is_no_signal(&row.signal_values()),
            PreFilter::Custom(predicate) => predicate(row),
        }
    }
}

impl<R> std::fmt::Debug for PreFilter<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreFilter::KeepAll => write!(f, "KeepAll"),
            PreFilter::DropAllZero => write!(f, "DropAllZero"),
            PreFilter::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// A payload carries no signal when it has values and all are zero or
/// missing. An empty payload is kept. NaN (non-numeric text) is signal.
pub fn is_no_signal(values: &[Option<f64>]) -> bool {
    !values.is_empty() && values.iter().all(|v| v.map_or(true, |x| x == 0.0))
}
