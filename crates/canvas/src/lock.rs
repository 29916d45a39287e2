//! Cross-process mutual exclusion over the shared `cache_state` record.
//!
//! There is deliberately no in-process mutex here: multiple server processes
//! on separate machines coordinate only through atomic updates on the
//! singleton durable record. The backing primitive is swappable behind
//! [`CacheStateRepo`]; this coordinator preserves the test-and-set plus
//! conditional-timeout-reclaim contract on top of it.

use crate::error::CanvasResult;
use mural_core::LockOptions;
use mural_history::HistoryStore;
use std::sync::Arc;
use std::time::Duration;

/// How a waiting caller got out of the poll loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockOutcome {
    /// The holder released the lock; the caller does not own it.
    Free,
    /// The lock was abandoned past the deadlock threshold and this caller won
    /// the conditional takeover. It now owns the lock and must release it.
    Reclaimed,
}

/// Coordinator for the sync lock.
pub struct LockCoordinator {
    store: Arc<dyn HistoryStore>,
    opts: LockOptions,
}

impl LockCoordinator {
    pub fn new(store: Arc<dyn HistoryStore>, opts: LockOptions) -> Self {
        Self { store, opts }
    }

    /// Atomically test-and-set the lock; true iff this caller now holds it.
    pub async fn try_acquire(&self) -> CanvasResult<bool> {
        Ok(self.store.try_acquire_sync_lock().await?)
    }

    /// Unconditionally clear the lock.
    ///
    /// Must run on every exit path of the critical section that followed a
    /// successful acquisition or reclaim, including error paths.
    pub async fn release(&self) -> CanvasResult<()> {
        self.store.release_sync_lock().await?;
        Ok(())
    }

    /// Wait for the lock to be released, reclaiming it if abandoned.
    ///
    /// Polls the lock field, backing off geometrically from the configured
    /// interval up to its cap. On each round a conditional takeover is
    /// attempted; the store's affected-row count arbitrates so at most one
    /// waiter wins once the holder has been silent past the deadlock
    /// threshold. Cancellable by dropping the future; no lock state is owned
    /// until `Reclaimed` is returned.
    pub async fn wait_free_or_reclaim(&self) -> CanvasResult<LockOutcome> {
        let mut interval = self.opts.poll_interval();

        loop {
            if self.store.read_sync_lock().await?.is_none() {
                return Ok(LockOutcome::Free);
            }

            if self
                .store
                .reclaim_sync_lock(self.opts.deadlock_timeout())
                .await?
            {
                tracing::warn!(
                    timeout_secs = self.opts.deadlock_timeout().as_secs(),
                    "sync lock considered deadlocked, reclaimed"
                );
                return Ok(LockOutcome::Reclaimed);
            }

            tokio::time::sleep(interval).await;
            interval = next_interval(interval, self.opts.max_poll_interval());
        }
    }
}

fn next_interval(current: Duration, cap: Duration) -> Duration {
    (current * 2).min(cap)
}
