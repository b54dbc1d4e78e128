//! Crate-level error type
//!
//! Paged queries report failures through [`PageError`]; this type wraps those
//! together with configuration, I/O and serialization failures for
//! applications that drive the whole stack.

use thiserror::Error;

use crate::repository::{PageError, QueryExecutionError};

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the crate
///
/// Large error variants are boxed to reduce stack size
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Page request or query execution error
    #[error(transparent)]
    Page(#[from] PageError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Tracing subscriber could not be installed
    #[error("Tracing error: {0}")]
    Tracing(String),

    /// Database pool could not be established
    #[cfg(feature = "database")]
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Database driver error outside of a paged query
    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(Box<sqlx::Error>),
}

// Manual From implementations for boxed errors
impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl From<QueryExecutionError> for Error {
    fn from(err: QueryExecutionError) -> Self {
        Error::Page(PageError::from(err))
    }
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Database(Box::new(err))
    }
}
