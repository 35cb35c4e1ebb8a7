//! Reporting module.
//!
//! Turns one cycle's results into a grouped text report, a numeric
//! summary and a flat alert list.

pub mod alerts;
pub mod render;

pub use alerts::*;
pub use render::*;
