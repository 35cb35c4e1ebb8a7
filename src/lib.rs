//! IngestWatch Core - freshness monitoring and idempotent write accounting
//!
//! This crate is the evaluation core of a market-data ingestion system. It
//! answers two questions for an external driver:
//!
//! 1. **Freshness** - is each data stream still being updated on schedule?
//! 2. **Write accounting** - did an upsert add a new fact, or re-observe a
//!    stored one?
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `registry` - Stream configuration (table, time column, thresholds)
//! - `clock` - Time source and the fixed UTC+7 display offset
//! - `freshness` - Per-stream evaluation, continuity and cycle metrics
//! - `report` - Status grouping, text report and alerts
//! - `pipeline` - Cycle orchestration with per-stream sessions and timeouts
//! - `upsert` - Batch upsert classification with pre-filters
//! - `storage` - Store traits, SQL builders and the SQLite backend
//! - `logging` - Structured logging with run context
//!
//! With the `python` feature the crate builds as a Python extension module
//! exposing `check_freshness` and `upsert_batch`.

pub mod logging;

pub mod clock;
pub mod error;
pub mod freshness;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod storage;
pub mod upsert;

#[cfg(feature = "python")]
mod python;

pub use error::{RegistryError, StoreError, UpsertError};
pub use freshness::status::{FreshnessResult, FreshnessStatus};
pub use pipeline::monitor::{Monitor, MonitorConfig, StreamResults};
pub use report::{generate_alerts, log_report, render_report, ReportSummary};
pub use upsert::classifier::{classify_upsert_batch, UpsertOptions};
pub use upsert::outcome::{BatchUpsertSummary, UpsertStrategy, WriteOutcome};

/// Initialize the process logger (idempotent).
pub fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_millis()
        .try_init();
}

/// Evaluate one stream by name. Never fails; problems are `ERROR` results.
pub fn evaluate_stream(monitor: &Monitor, name: &str) -> FreshnessResult {
    monitor.evaluate_stream(name)
}

/// Evaluate every registered stream, in registry-declaration order.
pub fn evaluate_all(monitor: &Monitor) -> StreamResults {
    monitor.evaluate_all()
}
