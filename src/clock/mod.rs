//! Time source module.
//!
//! All comparisons use epoch milliseconds. The fixed UTC+7 offset is only
//! used for display and for decoding wall-clock datetime columns.

pub mod source;

pub use source::*;
