//! In-memory history store and line cache for canvas tests.
//!
//! Both doubles implement the real traits over mutex-held state and expose
//! counters so tests can observe lock traffic, rebuild batches, and batch
//! concurrency.

use async_trait::async_trait;
use bytes::Bytes;
use mural_cache::error::{CacheError, CacheResult};
use mural_cache::traits::LineCache;
use mural_history::error::HistoryResult;
use mural_history::models::{CacheStateRow, CurrentPixelRow, PixelRow};
use mural_history::repos::{CacheStateRepo, PixelRepo};
use mural_history::store::HistoryStore;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use time::OffsetDateTime;

/// A held sync lock.
///
/// Age is measured against the tokio clock (`set_at.elapsed() + backdate`) so
/// paused-time tests can cross the deadlock threshold without real waiting;
/// `stamp` is what `read_sync_lock` reports.
#[derive(Clone, Copy)]
struct LockStamp {
    stamp: OffsetDateTime,
    set_at: tokio::time::Instant,
    backdate: Duration,
}

impl LockStamp {
    fn now() -> Self {
        Self::backdated(Duration::ZERO)
    }

    fn backdated(backdate: Duration) -> Self {
        Self {
            stamp: OffsetDateTime::now_utc() - backdate,
            set_at: tokio::time::Instant::now(),
            backdate,
        }
    }

    fn age(&self) -> Duration {
        self.set_at.elapsed() + self.backdate
    }
}

struct HistoryState {
    pixels: Vec<PixelRow>,
    next_id: i64,
    last_modified: OffsetDateTime,
    last_synced: Option<OffsetDateTime>,
    sync_lock: Option<LockStamp>,
}

/// Mutex-backed history store. Lock operations are atomic under the mutex,
/// mirroring the row-locked statements of the PostgreSQL implementation.
pub struct MemoryHistory {
    inner: Mutex<HistoryState>,
    acquire_attempts: AtomicUsize,
}

#[allow(dead_code)]
impl MemoryHistory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(HistoryState {
                pixels: Vec::new(),
                next_id: 1,
                last_modified: OffsetDateTime::now_utc(),
                last_synced: None,
                sync_lock: None,
            }),
            acquire_attempts: AtomicUsize::new(0),
        })
    }

    /// Number of `try_acquire_sync_lock` calls observed.
    pub fn acquire_attempts(&self) -> usize {
        self.acquire_attempts.load(Ordering::SeqCst)
    }

    pub fn lock_held(&self) -> bool {
        self.inner.lock().unwrap().sync_lock.is_some()
    }

    /// Set the lock as if some process acquired it `age` ago and vanished.
    pub fn force_lock(&self, age: Duration) {
        self.inner.lock().unwrap().sync_lock = Some(LockStamp::backdated(age));
    }

    pub fn pixel_count(&self) -> usize {
        self.inner.lock().unwrap().pixels.len()
    }

    pub fn snapshot(&self) -> CacheStateRow {
        let state = self.inner.lock().unwrap();
        CacheStateRow {
            last_modified: state.last_modified,
            last_synced: state.last_synced,
            sync_lock: state.sync_lock.map(|l| l.stamp),
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn migrate(&self) -> HistoryResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> HistoryResult<()> {
        Ok(())
    }
}

#[async_trait]
impl PixelRepo for MemoryHistory {
    async fn insert_pixel(&self, x: u32, y: u32, rgb: &str, user_id: i64) -> HistoryResult<()> {
        let mut state = self.inner.lock().unwrap();
        let now = OffsetDateTime::now_utc();
        let id = state.next_id;
        state.next_id += 1;
        state.pixels.push(PixelRow {
            pixel_history_id: id,
            x: x as i32,
            y: y as i32,
            rgb: rgb.to_string(),
            user_id,
            inserted_at: now,
            deleted: false,
        });
        state.last_modified = now;
        Ok(())
    }

    async fn scan_current_pixels(&self) -> HistoryResult<Vec<CurrentPixelRow>> {
        let state = self.inner.lock().unwrap();
        let mut latest: BTreeMap<(i32, i32), String> = BTreeMap::new();
        for pixel in state.pixels.iter().filter(|p| !p.deleted) {
            latest.insert((pixel.x, pixel.y), pixel.rgb.clone());
        }
        Ok(latest
            .into_iter()
            .map(|((x, y), rgb)| CurrentPixelRow { x, y, rgb })
            .collect())
    }

    async fn latest_pixel(&self, x: u32, y: u32) -> HistoryResult<Option<PixelRow>> {
        let state = self.inner.lock().unwrap();
        Ok(state
            .pixels
            .iter()
            .filter(|p| p.x == x as i32 && p.y == y as i32 && !p.deleted)
            .max_by_key(|p| p.pixel_history_id)
            .cloned())
    }
}

#[async_trait]
impl CacheStateRepo for MemoryHistory {
    async fn cache_state(&self) -> HistoryResult<CacheStateRow> {
        Ok(self.snapshot())
    }

    async fn mark_synced(&self) -> HistoryResult<()> {
        self.inner.lock().unwrap().last_synced = Some(OffsetDateTime::now_utc());
        Ok(())
    }

    async fn try_acquire_sync_lock(&self) -> HistoryResult<bool> {
        self.acquire_attempts.fetch_add(1, Ordering::SeqCst);
        let mut state = self.inner.lock().unwrap();
        let was_free = state.sync_lock.is_none();
        // Stamps unconditionally, like the row-locked read-and-write in the
        // PostgreSQL implementation.
        state.sync_lock = Some(LockStamp::now());
        Ok(was_free)
    }

    async fn release_sync_lock(&self) -> HistoryResult<()> {
        self.inner.lock().unwrap().sync_lock = None;
        Ok(())
    }

    async fn reclaim_sync_lock(&self, older_than: Duration) -> HistoryResult<bool> {
        let mut state = self.inner.lock().unwrap();
        match state.sync_lock {
            Some(held) if held.age() > older_than => {
                state.sync_lock = Some(LockStamp::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn read_sync_lock(&self) -> HistoryResult<Option<OffsetDateTime>> {
        Ok(self.inner.lock().unwrap().sync_lock.map(|l| l.stamp))
    }
}

/// Mutex-backed line cache with batch accounting.
pub struct MemoryLineCache {
    lines: Mutex<HashMap<u32, Vec<u8>>>,
    batch_count: AtomicUsize,
    active_batches: AtomicUsize,
    max_active_batches: AtomicUsize,
    batch_delay: Option<Duration>,
    fail_next_batch: AtomicBool,
}

#[allow(dead_code)]
impl MemoryLineCache {
    pub fn new() -> Arc<Self> {
        Self::with_batch_delay(None)
    }

    /// A cache whose batch writes take `delay`, to widen the window in which
    /// overlapping rebuilds would be observable.
    pub fn with_batch_delay(delay: Option<Duration>) -> Arc<Self> {
        Arc::new(Self {
            lines: Mutex::new(HashMap::new()),
            batch_count: AtomicUsize::new(0),
            active_batches: AtomicUsize::new(0),
            max_active_batches: AtomicUsize::new(0),
            batch_delay: delay,
            fail_next_batch: AtomicBool::new(false),
        })
    }

    /// Completed batch writes.
    pub fn batch_count(&self) -> usize {
        self.batch_count.load(Ordering::SeqCst)
    }

    /// Highest number of batch writes ever in flight at once.
    pub fn max_active_batches(&self) -> usize {
        self.max_active_batches.load(Ordering::SeqCst)
    }

    /// Make the next batch write fail without touching any line.
    pub fn fail_next_batch(&self) {
        self.fail_next_batch.store(true, Ordering::SeqCst);
    }

    pub fn remove_line(&self, y: u32) {
        self.lines.lock().unwrap().remove(&y);
    }

    pub fn line(&self, y: u32) -> Option<Vec<u8>> {
        self.lines.lock().unwrap().get(&y).cloned()
    }
}

#[async_trait]
impl LineCache for MemoryLineCache {
    async fn get_line(&self, y: u32) -> CacheResult<Option<Bytes>> {
        Ok(self.lines.lock().unwrap().get(&y).cloned().map(Bytes::from))
    }

    async fn set_line(&self, y: u32, data: Bytes) -> CacheResult<()> {
        self.lines.lock().unwrap().insert(y, data.to_vec());
        Ok(())
    }

    async fn set_lines(&self, lines: Vec<(u32, Bytes)>) -> CacheResult<()> {
        if self.fail_next_batch.swap(false, Ordering::SeqCst) {
            return Err(CacheError::BatchFailed {
                expected: lines.len(),
                acknowledged: 0,
            });
        }

        let active = self.active_batches.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_batches.fetch_max(active, Ordering::SeqCst);

        if let Some(delay) = self.batch_delay {
            tokio::time::sleep(delay).await;
        }

        {
            let mut map = self.lines.lock().unwrap();
            for (y, data) in lines {
                map.insert(y, data.to_vec());
            }
        }

        self.active_batches.fetch_sub(1, Ordering::SeqCst);
        self.batch_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn patch_line(&self, y: u32, offset: usize, data: &[u8]) -> CacheResult<()> {
        let mut map = self.lines.lock().unwrap();
        let line = map.entry(y).or_default();
        // Zero-pad like SETRANGE does on short values.
        if line.len() < offset + data.len() {
            line.resize(offset + data.len(), 0);
        }
        line[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }
}
