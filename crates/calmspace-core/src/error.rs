//! Core error types for calmspace-core.
//!
//! This module defines the error hierarchy using thiserror. Storage failures
//! are kept distinct from configuration and validation problems so callers can
//! decide whether a failed reward should be surfaced or ignored.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for calmspace-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Key-value storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing store
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Reading a key failed
    #[error("Failed to read '{key}': {message}")]
    ReadFailed { key: String, message: String },

    /// Writing one or more keys failed
    #[error("Failed to write '{key}': {message}")]
    WriteFailed { key: String, message: String },

    /// Store is locked by another writer
    #[error("Store is locked")]
    Locked,
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

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl StorageError {
    pub(crate) fn read(key: &str, err: impl std::fmt::Display) -> Self {
        StorageError::ReadFailed {
            key: key.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn write(key: &str, err: impl std::fmt::Display) -> Self {
        StorageError::WriteFailed {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}

/// Classify a rusqlite failure on `key`, mapping busy/locked databases to
/// [`StorageError::Locked`].
pub(crate) fn classify_sqlite(key: &str, err: rusqlite::Error, writing: bool) -> StorageError {
    if let rusqlite::Error::SqliteFailure(inner, _) = &err {
        if matches!(
            inner.code,
            rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy
        ) {
            return StorageError::Locked;
        }
    }
    if writing {
        StorageError::write(key, err)
    } else {
        StorageError::read(key, err)
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
