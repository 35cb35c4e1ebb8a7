//! Stream registry module.
//!
//! Static mapping from stream name to storage location and staleness
//! thresholds. Built once at process start, read-only afterwards.

pub mod config;
pub mod streams;

pub use config::*;
pub use streams::*;
