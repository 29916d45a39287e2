//! PostgreSQL-based history store implementation.

use crate::error::HistoryResult;
use crate::models::{CacheStateRow, CurrentPixelRow, PixelRow};
use crate::repos::{CacheStateRepo, PixelRepo};
use crate::store::HistoryStore;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use std::time::Duration;
use time::OffsetDateTime;

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

fn postgres_schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

/// PostgreSQL-based history store.
pub struct PostgresHistory {
    pool: Pool<Postgres>,
}

impl PostgresHistory {
    /// Create a new PostgreSQL store from a connection URL.
    pub async fn from_url(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> HistoryResult<Self> {
        let mut opts = PgConnectOptions::from_str(url)?;

        // Prevent hung queries from pinning pool connections.
        if let Some(timeout_ms) = statement_timeout_ms {
            opts = opts.options([("statement_timeout", format!("{}ms", timeout_ms))]);
            tracing::info!("PostgreSQL statement_timeout set to {}ms", timeout_ms);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl HistoryStore for PostgresHistory {
    async fn migrate(&self) -> HistoryResult<()> {
        // PostgreSQL doesn't allow multiple statements in a single prepared
        // statement, so we split the schema and execute each one separately.
        for statement in postgres_schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> HistoryResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl PixelRepo for PostgresHistory {
    async fn insert_pixel(&self, x: u32, y: u32, rgb: &str, user_id: i64) -> HistoryResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO pixel_history (x, y, rgb, user_id, deleted)
            VALUES ($1, $2, $3, $4, FALSE)
            "#,
        )
        .bind(x as i32)
        .bind(y as i32)
        .bind(rgb)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE cache_state SET last_modified = now()")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn scan_current_pixels(&self) -> HistoryResult<Vec<CurrentPixelRow>> {
        let rows = sqlx::query_as::<_, CurrentPixelRow>(
            "SELECT x, y, rgb FROM current_pixel ORDER BY x, y",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn latest_pixel(&self, x: u32, y: u32) -> HistoryResult<Option<PixelRow>> {
        let row = sqlx::query_as::<_, PixelRow>(
            r#"
            SELECT * FROM pixel_history
            WHERE x = $1 AND y = $2 AND NOT deleted
            ORDER BY pixel_history_id DESC
            LIMIT 1
            "#,
        )
        .bind(x as i32)
        .bind(y as i32)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl CacheStateRepo for PostgresHistory {
    async fn cache_state(&self) -> HistoryResult<CacheStateRow> {
        let row = sqlx::query_as::<_, CacheStateRow>(
            "SELECT last_modified, last_synced, sync_lock FROM cache_state",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn mark_synced(&self) -> HistoryResult<()> {
        sqlx::query("UPDATE cache_state SET last_synced = now()")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn try_acquire_sync_lock(&self) -> HistoryResult<bool> {
        // Row-locked read-and-write in one statement: the self join returns
        // the previous lock value while unconditionally setting the new one.
        let previous: Option<OffsetDateTime> = sqlx::query_scalar(
            r#"
            UPDATE cache_state s
            SET sync_lock = now()
            FROM (SELECT sync_lock FROM cache_state FOR UPDATE) prev
            RETURNING prev.sync_lock
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(previous.is_none())
    }

    async fn release_sync_lock(&self) -> HistoryResult<()> {
        sqlx::query("UPDATE cache_state SET sync_lock = NULL")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn reclaim_sync_lock(&self, older_than: Duration) -> HistoryResult<bool> {
        // The WHERE clause arbitrates: among concurrent reclaimers, only one
        // update can observe a lock still past the threshold.
        let result = sqlx::query(
            r#"
            UPDATE cache_state
            SET sync_lock = now()
            WHERE sync_lock IS NOT NULL
              AND now() - sync_lock > make_interval(secs => $1)
            "#,
        )
        .bind(older_than.as_secs_f64())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn read_sync_lock(&self) -> HistoryResult<Option<OffsetDateTime>> {
        let lock: Option<OffsetDateTime> =
            sqlx::query_scalar("SELECT sync_lock FROM cache_state")
                .fetch_one(&self.pool)
                .await?;
        Ok(lock)
    }
}
