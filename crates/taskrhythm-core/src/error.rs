//! Core error types for taskrhythm-core.
//!
//! The scheduling algorithm itself never fails. Everything in here describes
//! the layers around it: persistence, configuration and boundary validation.

use std::path::PathBuf;
use thiserror::Error;

use crate::energy::WindowId;
use crate::task::TaskId;

/// Core error type for taskrhythm-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
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

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// A row the write depends on does not exist (or belongs to someone else)
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Assignment would point a task at a window of another user
    #[error("Task {task} cannot be assigned to window {window}: owners differ")]
    OwnershipViolation { task: TaskId, window: WindowId },

    /// A stored value could not be decoded
    #[error("Corrupt value for '{field}': {value}")]
    Corrupt { field: &'static str, value: String },
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

    /// Key does not exist in the configuration schema
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors raised at the input boundary.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Time of day did not parse as HH:MM
    #[error("Invalid time '{0}': expected HH:MM")]
    InvalidTimeFormat(String),

    /// Date did not parse as YYYY-MM-DD
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Unknown day of week
    #[error("Invalid day: '{0}'. Use 0-6 (Monday=0) or mon/tue/wed/thu/fri/sat/sun")]
    InvalidDay(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                DatabaseError::Locked
            }
            // Row decoders box a `DatabaseError` into the conversion failure.
            rusqlite::Error::FromSqlConversionFailure(idx, ty, source) => {
                match source.downcast::<DatabaseError>() {
                    Ok(inner) => *inner,
                    Err(source) => DatabaseError::QueryFailed(
                        rusqlite::Error::FromSqlConversionFailure(idx, ty, source).to_string(),
                    ),
                }
            }
            other => DatabaseError::QueryFailed(other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
