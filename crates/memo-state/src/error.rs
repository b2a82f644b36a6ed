//! Error types for memo-state

use thiserror::Error;

/// Errors raised while connecting to or preparing a backend
#[derive(Error, Debug)]
pub enum StateError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

impl From<surrealdb::Error> for StateError {
    fn from(err: surrealdb::Error) -> Self {
        StateError::Query(err.to_string())
    }
}

/// Errors produced by storage areas, tier adapters and the search index
#[derive(Error, Debug)]
pub enum StorageError {
    /// The whole area would grow past its quota.
    #[error("quota exceeded in {area} area: {bytes} bytes exceeds {quota} byte limit")]
    QuotaExceeded {
        area: String,
        bytes: u64,
        quota: u64,
    },

    /// A single item would grow past the per-item quota.
    #[error("item quota exceeded in {area} area: key {key} needs {bytes} bytes, limit is {quota}")]
    ItemQuotaExceeded {
        area: String,
        key: String,
        bytes: u64,
        quota: u64,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("search index unavailable: {0}")]
    Unavailable(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// True for both whole-area and per-item quota violations.
    pub fn is_quota(&self) -> bool {
        matches!(
            self,
            StorageError::QuotaExceeded { .. } | StorageError::ItemQuotaExceeded { .. }
        )
    }
}

impl From<surrealdb::Error> for StorageError {
    fn from(err: surrealdb::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}
