//! Redis line cache backend.

use crate::error::{CacheError, CacheResult};
use crate::traits::LineCache;
use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// Redis key for one canvas line.
pub fn line_key(y: u32) -> String {
    format!("canvas-line-{y}")
}

/// Redis-backed line cache.
///
/// Uses a multiplexed connection with automatic reconnection; clones of the
/// manager share one underlying connection, so per-call cloning is cheap.
pub struct RedisLineCache {
    conn: ConnectionManager,
}

impl RedisLineCache {
    /// Connect to Redis at the given URL.
    pub async fn new(url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl LineCache for RedisLineCache {
    async fn get_line(&self, y: u32) -> CacheResult<Option<Bytes>> {
        let mut conn = self.conn.clone();
        let data: Option<Vec<u8>> = conn.get(line_key(y)).await?;
        Ok(data.map(Bytes::from))
    }

    async fn set_line(&self, y: u32, data: Bytes) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(line_key(y), data.as_ref()).await?;
        Ok(())
    }

    async fn set_lines(&self, lines: Vec<(u32, Bytes)>) -> CacheResult<()> {
        let expected = lines.len();
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (y, data) in &lines {
            pipe.set(line_key(*y), data.as_ref());
        }

        let mut conn = self.conn.clone();
        let statuses: Vec<String> = pipe.query_async(&mut conn).await?;

        // MULTI/EXEC is all-or-nothing on the server, but verify every SET
        // was acknowledged before the caller advances `last_synced`.
        let acknowledged = statuses.iter().filter(|s| s.as_str() == "OK").count();
        if acknowledged != expected {
            return Err(CacheError::BatchFailed {
                expected,
                acknowledged,
            });
        }
        Ok(())
    }

    async fn patch_line(&self, y: u32, offset: usize, data: &[u8]) -> CacheResult<()> {
        // SETRANGE is atomic server-side: no read-modify-write, so concurrent
        // patches to one line cannot lose each other's writes.
        let mut conn = self.conn.clone();
        let _: i64 = conn.setrange(line_key(y), offset as isize, data).await?;
        Ok(())
    }
}
