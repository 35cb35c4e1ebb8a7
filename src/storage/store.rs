//! Query executor traits.
//!
//! A `StreamStore` is one database session. The monitor opens a fresh
//! session per stream through a `SessionFactory`, so streams never share a
//! cursor or transaction.

use crate::error::StoreResult;
use crate::registry::config::StreamConfig;
use crate::storage::models::StreamStats;

/// Cancels the query currently running on a session.
pub trait QueryInterrupt: Send + Sync {
    fn interrupt(&self);
}

/// The queries the freshness evaluator needs from a store.
pub trait StreamStore {
    /// `COUNT(*)`, `MAX(t)`, `MIN(t)` with `t` in epoch milliseconds.
    fn stream_stats(&self, config: &StreamConfig) -> StoreResult<StreamStats>;

    /// Rows with `start_ms <= t < end_ms`, or `t >= start_ms` when `end_ms` is `None`.
    fn count_in_range(
        &self,
        config: &StreamConfig,
        start_ms: i64,
        end_ms: Option<i64>,
    ) -> StoreResult<u64>;

    /// Up to `limit` most recent timestamps, newest first.
    fn latest_timestamps(&self, config: &StreamConfig, limit: usize) -> StoreResult<Vec<i64>>;

    /// Handle that aborts an in-flight query from another thread.
    fn interrupt_handle(&self) -> Option<Box<dyn QueryInterrupt>> {
        None
    }
}

/// Opens independent store sessions, one per evaluated stream.
pub trait SessionFactory: Send + Sync {
    fn open_session(&self) -> StoreResult<Box<dyn StreamStore>>;

    /// Backend identifier for logging.
    fn backend(&self) -> &'static str;
}
