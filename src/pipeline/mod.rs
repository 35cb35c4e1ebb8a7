//! Pipeline orchestration module.
//!
//! Run contexts for monitoring cycles and upsert batches, and the
//! monitor that evaluates every registered stream once per cycle.

pub mod context;
pub mod monitor;

pub use context::*;
pub use monitor::*;
