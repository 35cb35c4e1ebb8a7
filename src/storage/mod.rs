//! Storage module.
//!
//! Query executor traits consumed by the freshness evaluator and the
//! upsert classifier, SQL builders, and the SQLite backend.

pub mod models;
pub mod queries;
pub mod sqlite;
pub mod store;

pub use models::*;
pub use queries::*;
pub use sqlite::*;
pub use store::*;
