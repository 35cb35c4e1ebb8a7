//! Freshness evaluation module.
//!
//! Classifies one stream per call:
//! - Aggregate statistics and status buckets
//! - Hourly continuity scan
//! - Cycle pulse metrics
//! - Recommendations

pub mod continuity;
pub mod cycle;
pub mod evaluator;
pub mod recommendations;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;

pub use continuity::*;
pub use cycle::*;
pub use evaluator::*;
pub use recommendations::*;
pub use status::*;
