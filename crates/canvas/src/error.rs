//! Canvas core error types.

use thiserror::Error;

/// Canvas operation errors.
///
/// Three classes: connectivity (`History`, `Cache`), consistency
/// (`LineMissing`, `LineLength`, a failed batch inside `Cache`), and
/// validation (`OutOfBounds`, `Color`). Validation errors are raised before
/// any store or cache access.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error(transparent)]
    History(#[from] mural_history::HistoryError),

    #[error(transparent)]
    Cache(#[from] mural_cache::CacheError),

    #[error(transparent)]
    Color(#[from] mural_core::Error),

    #[error("pixel ({x}, {y}) outside canvas bounds {width}x{height}")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("cache line {y} missing")]
    LineMissing { y: u32 },

    #[error("cache line {y} has length {actual}, expected {expected}")]
    LineLength {
        y: u32,
        expected: usize,
        actual: usize,
    },
}

/// Result type for canvas operations.
pub type CanvasResult<T> = std::result::Result<T, CanvasError>;
