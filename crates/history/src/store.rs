//! History store trait.

use crate::error::HistoryResult;
use crate::repos::{CacheStateRepo, PixelRepo};
use async_trait::async_trait;

/// Combined history store trait.
#[async_trait]
pub trait HistoryStore: PixelRepo + CacheStateRepo + Send + Sync {
    /// Apply the schema, creating tables and seeding the singleton
    /// `cache_state` row if missing.
    async fn migrate(&self) -> HistoryResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> HistoryResult<()>;
}
