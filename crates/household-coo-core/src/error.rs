//! Core error types for household-coo-core.
//!
//! This module defines the error hierarchy using thiserror. Each concern
//! (storage, configuration, budget, instructions, validation) has its own
//! enum, and [`CoreError`] wraps them for callers that only need one type.

use std::path::PathBuf;
use thiserror::Error;

use crate::money::Usd;

/// Core error type for household-coo-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Budget ledger errors
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// Instruction fetch errors
    #[error(transparent)]
    Instruction(#[from] InstructionError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No task with the given id exists
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Imported document could not be used as app state
    #[error("Invalid JSON data: {0}")]
    InvalidImport(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
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

    /// Unknown key or a value that does not fit the key's type
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Budget ledger errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BudgetError {
    /// A charge exceeded the spendable balance
    #[error("Insufficient balance. Required: {required}, Available: {available}")]
    InsufficientBalance { required: Usd, available: Usd },

    /// Credits and debits must be strictly positive
    #[error("Invalid amount: {0} (must be greater than zero)")]
    InvalidAmount(Usd),
}

/// Instruction fetch errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstructionError {
    /// The assistant could not be reached
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is missing or blank
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Score outside the 0..=100 range
    #[error("Score for '{field}' out of range: {value} (expected 0..=100)")]
    ScoreOutOfRange { field: String, value: i64 },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
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
