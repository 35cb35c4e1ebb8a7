//! Error types for ingestwatch-core.
//!
//! Errors never cross the per-stream boundary of a monitoring cycle: the
//! monitor converts them into `FreshnessStatus::Error` results. They do
//! surface from registry construction and upsert batches.

use thiserror::Error;

/// Registry and stream configuration errors.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Lookup of a stream that is not configured (R001)
    #[error("[R001] Unknown stream: {0}")]
    UnknownStream(String),

    /// Two streams registered under the same name (R002)
    #[error("[R002] Duplicate stream: {0}")]
    DuplicateStream(String),

    /// Thresholds not finite, negative, or not strictly increasing (R003)
    #[error("[R003] Invalid thresholds for {stream}: {reason}")]
    InvalidThresholds { stream: String, reason: String },

    /// Table or column name that is not a plain SQL identifier (R004)
    #[error("[R004] Invalid SQL identifier for {stream}: {identifier:?}")]
    InvalidIdentifier { stream: String, identifier: String },

    /// Registry JSON could not be parsed (R005)
    #[error("[R005] Registry parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Store (query executor) errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Session could not be opened (S001)
    #[error("[S001] Store connection failed: {0}")]
    Connection(String),

    /// Query failed in the driver (S002)
    #[error("[S002] Query failed: {message}")]
    QueryFailure { message: String, sql: String },

    /// Query cancelled through the session's interrupt handle (S003)
    #[error("[S003] Query interrupted")]
    Interrupted,

    /// Upsert table or column name that is not a plain SQL identifier (S004)
    #[error("[S004] Invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Row shape does not match the upsert table (S005)
    #[error("[S005] Row shape mismatch: {0}")]
    ShapeMismatch(String),
}

impl StoreError {
    pub fn query(err: impl std::fmt::Display, sql: &str) -> Self {
        StoreError::QueryFailure {
            message: err.to_string(),
            sql: sql.to_string(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::OperationInterrupted => {
                StoreError::Interrupted
            }
            _ => StoreError::QueryFailure {
                message: err.to_string(),
                sql: String::new(),
            },
        }
    }
}

/// Upsert batch errors.
#[derive(Error, Debug)]
pub enum UpsertError {
    /// The writer failed on a row; the batch is aborted (U001)
    #[error("[U001] Upsert failed for key {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: StoreError,
    },

    /// Begin/commit of the batch transaction failed (U002)
    #[error("[U002] Upsert transaction failed: {0}")]
    Transaction(#[source] StoreError),
}

/// Result type alias for StoreError
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for RegistryError
pub type RegistryResult<T> = Result<T, RegistryError>;
