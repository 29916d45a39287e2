//! Row-oriented canvas line cache for the mural canvas.
//!
//! This crate provides the fast half of the canvas state:
//! - The `LineCache` trait: per-row byte buffers with atomic batch overwrite
//!   and atomic in-place range patches
//! - The Redis backend used in production

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::redis::{line_key, RedisLineCache};
pub use error::{CacheError, CacheResult};
pub use traits::LineCache;

use std::sync::Arc;

/// Create a line cache from configuration.
pub async fn from_config(config: &mural_core::CacheConfig) -> CacheResult<Arc<dyn LineCache>> {
    tracing::info!("Connecting to Redis line cache");
    let backend = RedisLineCache::new(&config.url).await?;
    Ok(Arc::new(backend) as Arc<dyn LineCache>)
}
