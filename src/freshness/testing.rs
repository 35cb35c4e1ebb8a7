//! In-memory store doubles shared by unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{StoreError, StoreResult};
use crate::registry::config::StreamConfig;
use crate::storage::models::StreamStats;
use crate::storage::store::{QueryInterrupt, SessionFactory, StreamStore};

/// Store over a list of epoch-ms timestamps, one row each.
#[derive(Debug, Clone, Default)]
pub struct VecStore {
    rows: Vec<i64>,
}

impl VecStore {
    pub fn new(rows: Vec<i64>) -> Self {
        Self { rows }
    }
}

impl StreamStore for VecStore {
    fn stream_stats(&self, _config: &StreamConfig) -> StoreResult<StreamStats> {
        Ok(StreamStats {
            total_records: self.rows.len() as u64,
            latest_millis: self.rows.iter().copied().max(),
            earliest_millis: self.rows.iter().copied().min(),
        })
    }

    fn count_in_range(&self, _config: &StreamConfig, start_ms: i64, end_ms: Option<i64>) -> StoreResult<u64> {
        Ok(self
            .rows
            .iter()
            .filter(|t| **t >= start_ms && end_ms.map_or(true, |end| **t < end))
            .count() as u64)
    }

    fn latest_timestamps(&self, _config: &StreamConfig, limit: usize) -> StoreResult<Vec<i64>> {
        let mut rows = self.rows.clone();
        rows.sort_unstable_by(|a, b| b.cmp(a));
        rows.truncate(limit);
        Ok(rows)
    }
}

/// Store whose every query fails.
pub struct FailingStore;

impl StreamStore for FailingStore {
    fn stream_stats(&self, config: &StreamConfig) -> StoreResult<StreamStats> {
        Err(StoreError::query(
            format!("no such table: {}", config.table()),
            "SELECT COUNT(*)",
        ))
    }

    fn count_in_range(&self, _: &StreamConfig, _: i64, _: Option<i64>) -> StoreResult<u64> {
        Err(StoreError::query("connection reset", "SELECT COUNT(*)"))
    }

    fn latest_timestamps(&self, _: &StreamConfig, _: usize) -> StoreResult<Vec<i64>> {
        Err(StoreError::query("connection reset", "SELECT"))
    }
}

/// Store that blocks in `stream_stats` until interrupted.
pub struct HangingStore {
    interrupted: Arc<AtomicBool>,
}

struct FlagInterrupt(Arc<AtomicBool>);

impl QueryInterrupt for FlagInterrupt {
    fn interrupt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl StreamStore for HangingStore {
    fn stream_stats(&self, _: &StreamConfig) -> StoreResult<StreamStats> {
        while !self.interrupted.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(5));
        }
        Err(StoreError::Interrupted)
    }

    fn count_in_range(&self, _: &StreamConfig, _: i64, _: Option<i64>) -> StoreResult<u64> {
        Ok(0)
    }

    fn latest_timestamps(&self, _: &StreamConfig, _: usize) -> StoreResult<Vec<i64>> {
        Ok(Vec::new())
    }

    fn interrupt_handle(&self) -> Option<Box<dyn QueryInterrupt>> {
        Some(Box::new(FlagInterrupt(self.interrupted.clone())))
    }
}

/// Routes sessions by table name: `broken_*` fail, `hanging_*` block,
/// everything else reads `rows`.
pub struct ScriptedFactory {
    pub rows: Vec<i64>,
}

/// A session that dispatches on the configured table.
struct ScriptedSession {
    rows: VecStore,
    hanging: HangingStore,
}

impl StreamStore for ScriptedSession {
    fn stream_stats(&self, config: &StreamConfig) -> StoreResult<StreamStats> {
        if config.table().starts_with("broken_") {
            FailingStore.stream_stats(config)
        } else if config.table().starts_with("hanging_") {
            self.hanging.stream_stats(config)
        } else {
            self.rows.stream_stats(config)
        }
    }

    fn count_in_range(&self, config: &StreamConfig, start_ms: i64, end_ms: Option<i64>) -> StoreResult<u64> {
        self.rows.count_in_range(config, start_ms, end_ms)
    }

    fn latest_timestamps(&self, config: &StreamConfig, limit: usize) -> StoreResult<Vec<i64>> {
        self.rows.latest_timestamps(config, limit)
    }

    fn interrupt_handle(&self) -> Option<Box<dyn QueryInterrupt>> {
        self.hanging.interrupt_handle()
    }
}

impl SessionFactory for ScriptedFactory {
    fn open_session(&self) -> StoreResult<Box<dyn StreamStore>> {
        Ok(Box::new(ScriptedSession {
            rows: VecStore::new(self.rows.clone()),
            hanging: HangingStore {
                interrupted: Arc::new(AtomicBool::new(false)),
            },
        }))
    }

    fn backend(&self) -> &'static str {
        "scripted"
    }
}

/// Factory that cannot open any session.
pub struct UnavailableFactory;

impl SessionFactory for UnavailableFactory {
    fn open_session(&self) -> StoreResult<Box<dyn StreamStore>> {
        Err(StoreError::Connection("connection refused".to_string()))
    }

    fn backend(&self) -> &'static str {
        "unavailable"
    }
}
