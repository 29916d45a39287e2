//! Pixel history repository trait.

use crate::error::HistoryResult;
use crate::models::{CurrentPixelRow, PixelRow};
use async_trait::async_trait;

/// Repository for the append-only pixel history.
#[async_trait]
pub trait PixelRepo: Send + Sync {
    /// Insert one placement record and advance `last_modified`, atomically.
    ///
    /// `rgb` is a 6-character lowercase hex color. Either both the history row
    /// and the freshness bump commit, or neither does.
    async fn insert_pixel(&self, x: u32, y: u32, rgb: &str, user_id: i64) -> HistoryResult<()>;

    /// Scan the latest non-deleted record per cell, ordered by `(x, y)`.
    ///
    /// Cells that have never been painted are absent from the result.
    async fn scan_current_pixels(&self) -> HistoryResult<Vec<CurrentPixelRow>>;

    /// Fetch the most recent non-deleted record for one cell, if any.
    async fn latest_pixel(&self, x: u32, y: u32) -> HistoryResult<Option<PixelRow>>;
}
