//! Run context management.
//!
//! Provides cycle and batch context for logging and state tracking.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::logging::structured::LogContext;

fn short_id(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

/// Context for one monitoring cycle.
#[derive(Debug, Clone)]
pub struct CycleContext {
    pub cycle_id: String,
    pub started_at: DateTime<Utc>,
}

impl CycleContext {
    pub fn new() -> Self {
        Self {
            cycle_id: short_id("cycle"),
            started_at: Utc::now(),
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.cycle_id)
    }

    /// Logging context for one stream within this cycle.
    pub fn stream_context(&self, stream: &str) -> LogContext {
        self.log_context().with_stream(stream)
    }
}

impl Default for CycleContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Context for one upsert batch of an ingestion pipeline.
#[derive(Debug, Clone)]
pub struct BatchContext {
    pub batch_id: String,
    pub pipeline: String,
}

impl BatchContext {
    pub fn new(pipeline: &str) -> Self {
        Self {
            batch_id: short_id("batch"),
            pipeline: pipeline.to_string(),
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.batch_id).with_stream(&self.pipeline)
    }
}
