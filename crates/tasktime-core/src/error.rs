//! Core error types for tasktime-core.
//!
//! Local-state failures surface synchronously to the caller. Nothing in the
//! core retries; the only swallowed cases are the documented idempotent no-ops
//! of the timer and streak tracker.

use std::path::PathBuf;
use thiserror::Error;

use crate::api::ApiError;

/// Core error type for tasktime-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Operation on a missing task, category or session id
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// Operation the data model does not permit (e.g. deleting a default category)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A timer session is already active
    #[error("A timer session is already running ({session_id})")]
    AlreadyRunning { session_id: String },

    /// Rejected input on create/update
    #[error("Invalid value for '{field}': {message}")]
    InvalidInput { field: String, message: String },

    /// Storage backend errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Entity named in a [`CoreError::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Task,
    Category,
    Session,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Task => "Task",
            EntityKind::Category => "Category",
            EntityKind::Session => "Session",
        };
        f.write_str(name)
    }
}

impl CoreError {
    pub(crate) fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        CoreError::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// A stored document could not be decoded
    #[error("Corrupt document under key '{key}': {message}")]
    Corrupt { key: String, message: String },

    /// The data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity() {
        let err = CoreError::not_found(EntityKind::Task, "abc");
        assert_eq!(err.to_string(), "Task not found: abc");
    }

    #[test]
    fn storage_error_converts_into_core_error() {
        let err: CoreError = StorageError::Locked.into();
        assert!(matches!(err, CoreError::Storage(StorageError::Locked)));
    }
}
