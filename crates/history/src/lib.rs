//! Durable pixel history store for the mural canvas.
//!
//! This crate provides the durable half of the canvas state:
//! - The append-only `pixel_history` relation and its `current_pixel`
//!   latest-per-cell projection
//! - The singleton `cache_state` freshness/lock record, including the atomic
//!   test-and-set and conditional-reclaim operations that back cross-process
//!   mutual exclusion

pub mod error;
pub mod models;
pub mod postgres;
pub mod repos;
pub mod store;

pub use error::{HistoryError, HistoryResult};
pub use postgres::PostgresHistory;
pub use repos::{CacheStateRepo, PixelRepo};
pub use store::HistoryStore;

use mural_core::HistoryConfig;
use std::sync::Arc;

/// Create a history store from configuration.
pub async fn from_config(config: &HistoryConfig) -> HistoryResult<Arc<dyn HistoryStore>> {
    tracing::info!("Connecting to PostgreSQL history store");
    let store = PostgresHistory::from_url(
        &config.url,
        config.max_connections,
        config.statement_timeout_ms,
    )
    .await?;
    Ok(Arc::new(store) as Arc<dyn HistoryStore>)
}
