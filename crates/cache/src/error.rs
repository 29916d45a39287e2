//! Line cache error types.

use thiserror::Error;

/// Line cache operation errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("batch write failed: {acknowledged} of {expected} lines acknowledged")]
    BatchFailed { expected: usize, acknowledged: usize },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for line cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;
