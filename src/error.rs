use thiserror::Error;

use crate::fragment::FragmentNameError;

/// Errors surfaced by the store, the resolver and the recording queries.
#[derive(Debug, Error)]
pub enum Error {
    /// Camera or recording absent
    #[error("{0} not found")]
    NotFound(String),

    /// A delete transaction could not complete and was rolled back
    #[error("failed to delete recording {recording_id}: {source}")]
    DeleteFailure {
        recording_id: i64,
        #[source]
        source: Box<Error>,
    },

    /// Stored data violates the fragment naming or metadata contract
    #[error("data integrity fault for '{path}': {reason}")]
    DataIntegrity { path: String, reason: String },

    /// A write would break a relation between records
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("database schema version mismatch: expected {expected}, found {found}")]
    SchemaVersion { expected: String, found: String },

    #[error("invalid fragment name: {0}")]
    FragmentName(#[from] FragmentNameError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("metadata encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
