//! Cache state repository trait: freshness tracking and the sync lock.

use crate::error::HistoryResult;
use crate::models::CacheStateRow;
use async_trait::async_trait;
use std::time::Duration;
use time::OffsetDateTime;

/// Repository for the singleton `cache_state` record.
///
/// The lock operations are the only cross-process coordination primitive in
/// the system. Each must be atomic at the store level: correctness spans
/// separate processes and machines, so an in-process mutex is useless here.
#[async_trait]
pub trait CacheStateRepo: Send + Sync {
    /// Read the singleton freshness/lock record.
    async fn cache_state(&self) -> HistoryResult<CacheStateRow>;

    /// Record that the line cache reflects the store as of now.
    async fn mark_synced(&self) -> HistoryResult<()>;

    /// Atomically test-and-set the sync lock.
    ///
    /// Unconditionally stamps `sync_lock` with now and returns true iff the
    /// previous value was NULL. Exactly one of any number of concurrent
    /// callers receives true.
    async fn try_acquire_sync_lock(&self) -> HistoryResult<bool>;

    /// Unconditionally clear the sync lock.
    async fn release_sync_lock(&self) -> HistoryResult<()>;

    /// Take over a lock held for longer than `older_than`.
    ///
    /// Conditionally sets `sync_lock` to now, only if the stored value is
    /// still older than the threshold. Returns true iff this caller won the
    /// conditional update; the affected-row count is the sole arbiter, so at
    /// most one of any number of concurrent reclaimers wins.
    async fn reclaim_sync_lock(&self, older_than: Duration) -> HistoryResult<bool>;

    /// Read the current lock timestamp, if held.
    async fn read_sync_lock(&self) -> HistoryResult<Option<OffsetDateTime>>;
}
