//! History store error types.

use thiserror::Error;

/// History store operation errors.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for history store operations.
pub type HistoryResult<T> = std::result::Result<T, HistoryError>;
