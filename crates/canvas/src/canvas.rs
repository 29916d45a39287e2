//! The canvas service: cache synchronization, pixel writes, board reads.

use crate::error::{CanvasError, CanvasResult};
use crate::lock::{LockCoordinator, LockOutcome};
use bytes::{Bytes, BytesMut};
use mural_cache::LineCache;
use mural_core::{CanvasConfig, Dimensions, Rgb, DEFAULT_COLOR};
use mural_history::HistoryStore;
use std::sync::Arc;
use std::time::Instant;

/// Shared collaborative pixel canvas over one durable history store and one
/// line cache.
///
/// The canvas owns no state of its own; it links the two explicitly owned
/// resources with one synchronization protocol. Instances are cheap and
/// stateless, so each server process can hold one behind an `Arc`.
pub struct Canvas {
    history: Arc<dyn HistoryStore>,
    cache: Arc<dyn LineCache>,
    dims: Dimensions,
    lock: LockCoordinator,
}

impl Canvas {
    pub fn new(
        history: Arc<dyn HistoryStore>,
        cache: Arc<dyn LineCache>,
        config: CanvasConfig,
    ) -> Self {
        let lock = LockCoordinator::new(history.clone(), config.lock);
        Self {
            history,
            cache,
            dims: config.dimensions,
            lock,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Make sure the line cache is up to date.
    ///
    /// Cheap when fresh: one freshness read, no lock traffic. When stale, one
    /// process rebuilds the whole cache under the sync lock while the others
    /// wait; an abandoned lock is reclaimed after the deadlock threshold and
    /// the reclaimer completes the rebuild itself.
    pub async fn sync(&self) -> CanvasResult<()> {
        loop {
            if !self.history.cache_state().await?.is_out_of_date() {
                tracing::debug!("canvas cache is up to date");
                return Ok(());
            }

            if self.lock.try_acquire().await? {
                self.rebuild_locked().await?;
            } else {
                tracing::info!("sync lock in use, waiting for holder to finish");
                match self.lock.wait_free_or_reclaim().await? {
                    // Re-check freshness; the holder usually synced for us.
                    LockOutcome::Free => continue,
                    LockOutcome::Reclaimed => self.rebuild_locked().await?,
                }
            }
        }
    }

    /// Place one pixel.
    ///
    /// Validates bounds first, then inserts the history record (bumping
    /// `last_modified` in the same transaction) and patches the cached line
    /// in place. The patch is an atomic range write, so concurrent writers to
    /// one row cannot lose each other's pixels. A successful patch is an
    /// immediate synchronization point: `last_synced` advances to now.
    pub async fn set_pixel(&self, x: u32, y: u32, rgb: Rgb, user_id: i64) -> CanvasResult<()> {
        self.check_bounds(x, y)?;
        self.sync().await?;

        self.history
            .insert_pixel(x, y, &rgb.to_hex(), user_id)
            .await?;
        self.cache
            .patch_line(y, self.dims.column_offset(x), rgb.as_bytes())
            .await?;
        self.history.mark_synced().await?;

        tracing::debug!(x, y, rgb = %rgb, user_id, "pixel placed");
        Ok(())
    }

    /// Return the whole board as one `width * height * 3` byte buffer.
    ///
    /// All-or-nothing: a missing or short line fails the read.
    pub async fn get_pixels(&self) -> CanvasResult<Bytes> {
        self.sync().await?;

        let mut board = BytesMut::with_capacity(self.dims.board_len());
        for y in 0..self.dims.height {
            board.extend_from_slice(&self.fetch_line(y).await?);
        }
        Ok(board.freeze())
    }

    /// Read one pixel from its cached line.
    pub async fn get_pixel(&self, x: u32, y: u32) -> CanvasResult<Rgb> {
        self.check_bounds(x, y)?;
        self.sync().await?;

        let line = self.fetch_line(y).await?;
        let offset = self.dims.column_offset(x);
        let mut bytes = [0u8; 3];
        bytes.copy_from_slice(&line[offset..offset + 3]);
        Ok(Rgb::from_bytes(bytes))
    }

    fn check_bounds(&self, x: u32, y: u32) -> CanvasResult<()> {
        if !self.dims.contains(x, y) {
            return Err(CanvasError::OutOfBounds {
                x,
                y,
                width: self.dims.width,
                height: self.dims.height,
            });
        }
        Ok(())
    }

    async fn fetch_line(&self, y: u32) -> CanvasResult<Bytes> {
        let line = self
            .cache
            .get_line(y)
            .await?
            .ok_or(CanvasError::LineMissing { y })?;
        if line.len() != self.dims.line_len() {
            return Err(CanvasError::LineLength {
                y,
                expected: self.dims.line_len(),
                actual: line.len(),
            });
        }
        Ok(line)
    }

    /// Run one rebuild while holding the sync lock, releasing it on every
    /// exit path.
    async fn rebuild_locked(&self) -> CanvasResult<()> {
        tracing::info!("sync lock held, starting cache rebuild");
        let rebuilt = self.rebuild().await;
        let released = self.lock.release().await;
        rebuilt?;
        released
    }

    /// Rebuild every cache line from the durable projection.
    ///
    /// The batch write is all-or-nothing; on any failure `last_synced` is
    /// left untouched so the next `sync()` retries from a clean full rebuild.
    async fn rebuild(&self) -> CanvasResult<()> {
        let start = Instant::now();

        let records = self.history.scan_current_pixels().await?;

        let mut lines: Vec<BytesMut> = (0..self.dims.height)
            .map(|_| {
                let mut line = BytesMut::with_capacity(self.dims.line_len());
                for _ in 0..self.dims.width {
                    line.extend_from_slice(DEFAULT_COLOR.as_bytes());
                }
                line
            })
            .collect();

        for record in records {
            let (x, y) = (record.x as u32, record.y as u32);
            if !self.dims.contains(x, y) {
                // Stale history from a previously larger canvas.
                tracing::debug!(x, y, "skipping out-of-bounds history record");
                continue;
            }
            let offset = self.dims.column_offset(x);
            let rgb = Rgb::from_hex(&record.rgb)?;
            lines[y as usize][offset..offset + 3].copy_from_slice(rgb.as_bytes());
        }

        let batch = lines
            .into_iter()
            .enumerate()
            .map(|(y, line)| (y as u32, line.freeze()))
            .collect();
        self.cache.set_lines(batch).await?;
        self.history.mark_synced().await?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "canvas cache rebuilt"
        );
        Ok(())
    }
}
