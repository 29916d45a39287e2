//! Line cache trait definitions.

use crate::error::CacheResult;
use async_trait::async_trait;
use bytes::Bytes;

/// Row-oriented byte cache for canvas lines.
///
/// Keys are row indices; values are `width * 3` byte buffers. Lines are only
/// ever overwritten, never deleted: a full rebuild replaces every line in one
/// atomic batch, a pixel write patches a 3-byte range in place.
#[async_trait]
pub trait LineCache: Send + Sync {
    /// Fetch one line. Returns None if the line has never been written.
    async fn get_line(&self, y: u32) -> CacheResult<Option<Bytes>>;

    /// Overwrite one line.
    async fn set_line(&self, y: u32, data: Bytes) -> CacheResult<()>;

    /// Overwrite a set of lines as one all-or-nothing batch.
    ///
    /// Implementations must guarantee that either every line is written or
    /// the cache is left untouched; a partial batch is an error.
    async fn set_lines(&self, lines: Vec<(u32, Bytes)>) -> CacheResult<()>;

    /// Atomically overwrite `data.len()` bytes of line `y` starting at
    /// `offset`, without a read-modify-write of the whole line.
    ///
    /// This is the per-pixel patch path: concurrent patches to the same line
    /// at different offsets must not lose each other's writes.
    async fn patch_line(&self, y: u32, offset: usize, data: &[u8]) -> CacheResult<()>;
}
