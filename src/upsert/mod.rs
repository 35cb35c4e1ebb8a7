//! Idempotent upsert accounting.
//!
//! Classifies every conditional write of an ingestion batch as fresh
//! (inserted) or duplicate (updated or unchanged), after dropping rows that
//! carry no signal:
//! - `row` - natural keys and payload access
//! - `filter` - no-signal pre-filter
//! - `outcome` - per-row outcomes and the batch summary
//! - `writer` - the conditional-write seam
//! - `classifier` - batch classification

pub mod classifier;
pub mod filter;
pub mod outcome;
pub mod row;
pub mod writer;

pub use classifier::*;
pub use filter::*;
pub use outcome::*;
pub use row::*;
pub use writer::*;
