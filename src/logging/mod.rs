//! Structured logging with cycle and stream context.
//!
//! Every log line emitted during a monitoring cycle carries the run id
//! and, where relevant, the stream name for easy correlation.

pub mod structured;

pub use structured::*;
