//! Error types for vetagenda.

use thiserror::Error;

/// Common error type for vetagenda.
#[derive(Error, Debug)]
pub enum AgendaError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// The operation conflicts with existing data (duplicate name, overlapping booking, ...).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for AgendaError {
    fn from(e: sqlx::Error) -> Self {
        AgendaError::Database(e.to_string())
    }
}

/// Result type alias for vetagenda operations.
pub type Result<T> = std::result::Result<T, AgendaError>;
