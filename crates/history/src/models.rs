//! Database models mapping to the history schema.

use sqlx::FromRow;
use time::OffsetDateTime;

/// One immutable pixel placement from the append-only history.
#[derive(Debug, Clone, FromRow)]
pub struct PixelRow {
    pub pixel_history_id: i64,
    pub x: i32,
    pub y: i32,
    /// 6-character lowercase hex color.
    pub rgb: String,
    pub user_id: i64,
    pub inserted_at: OffsetDateTime,
    pub deleted: bool,
}

/// Latest non-deleted color for one cell, from the `current_pixel` projection.
#[derive(Debug, Clone, FromRow)]
pub struct CurrentPixelRow {
    pub x: i32,
    pub y: i32,
    pub rgb: String,
}

/// The singleton cache freshness/lock record.
///
/// `last_modified` advances with every pixel insert; `last_synced` advances
/// only when the line cache provably reflects the store. `sync_lock` is the
/// cross-process mutual-exclusion token: non-NULL means some process holds it.
#[derive(Debug, Clone, FromRow)]
pub struct CacheStateRow {
    pub last_modified: OffsetDateTime,
    pub last_synced: Option<OffsetDateTime>,
    pub sync_lock: Option<OffsetDateTime>,
}

impl CacheStateRow {
    /// Whether the line cache can be considered out of date.
    ///
    /// A store that has never been synced counts as stale.
    pub fn is_out_of_date(&self) -> bool {
        match self.last_synced {
            Some(synced) => self.last_modified > synced,
            None => true,
        }
    }
}
