//! Rating store trait and the SQLite implementation.

use crate::error::StoreResult;
use crate::models::{RatingRow, StatsRow, UserRatingRow};
use crate::repos::stats::clamp_limit;
use crate::repos::{RatingRepo, StatsRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tally_core::{ItemKey, ItemStats, RatingIntent, RatingSummary, Transition, UserId};
use time::OffsetDateTime;

/// Combined rating store trait.
#[async_trait]
pub trait RatingStore: RatingRepo + StatsRepo + Send + Sync {
    /// Create tables and indexes if they do not exist.
    async fn migrate(&self) -> StoreResult<()>;

    /// Check database connectivity.
    async fn health_check(&self) -> StoreResult<()>;
}

/// SQLite-backed rating store kept in a local file.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and run migrations.
    pub async fn new(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        // A single connection serializes writers, which gives the
        // read-then-write sequence in set_rating row-level isolation.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl RatingStore for SqliteStore {
    async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

async fn fetch_summary(
    conn: &mut SqliteConnection,
    item_key: &ItemKey,
    user_id: &UserId,
) -> StoreResult<RatingSummary> {
    let aggregate = sqlx::query_as::<_, RatingRow>("SELECT * FROM ratings WHERE item_key = ?")
        .bind(item_key.as_str())
        .fetch_optional(&mut *conn)
        .await?;

    let user_rating = sqlx::query_as::<_, UserRatingRow>(
        "SELECT * FROM user_ratings WHERE item_key = ? AND user_id = ?",
    )
    .bind(item_key.as_str())
    .bind(user_id.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    let tally = aggregate.map(|row| row.tally()).unwrap_or_default();
    let vote = user_rating.map(|row| row.vote()).transpose()?;
    Ok(RatingSummary::new(tally, vote))
}

#[async_trait]
impl RatingRepo for SqliteStore {
    async fn get_rating(
        &self,
        item_key: &ItemKey,
        user_id: &UserId,
    ) -> StoreResult<RatingSummary> {
        let mut conn = self.pool.acquire().await?;
        fetch_summary(&mut *conn, item_key, user_id).await
    }

    async fn set_rating(
        &self,
        item_key: &ItemKey,
        user_id: &UserId,
        intent: RatingIntent,
    ) -> StoreResult<RatingSummary> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, UserRatingRow>(
            "SELECT * FROM user_ratings WHERE item_key = ? AND user_id = ?",
        )
        .bind(item_key.as_str())
        .bind(user_id.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .map(|row| row.vote())
        .transpose()?;

        let transition = Transition::plan(current, intent);
        let now = OffsetDateTime::now_utc();

        tracing::debug!(
            item_key = %item_key,
            user_id = %user_id,
            transition = transition.kind().as_str(),
            "Applying rating transition"
        );

        match (transition.previous, transition.next) {
            (None, Some(vote)) => {
                sqlx::query(
                    "INSERT INTO user_ratings (item_key, user_id, rating, created_at) VALUES (?, ?, ?, ?)",
                )
                .bind(item_key.as_str())
                .bind(user_id.as_str())
                .bind(vote.as_str())
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }
            (Some(_), None) => {
                sqlx::query("DELETE FROM user_ratings WHERE item_key = ? AND user_id = ?")
                    .bind(item_key.as_str())
                    .bind(user_id.as_str())
                    .execute(&mut *tx)
                    .await?;
            }
            (Some(previous), Some(vote)) if previous != vote => {
                sqlx::query(
                    "UPDATE user_ratings SET rating = ?, created_at = ? WHERE item_key = ? AND user_id = ?",
                )
                .bind(vote.as_str())
                .bind(now)
                .bind(item_key.as_str())
                .bind(user_id.as_str())
                .execute(&mut *tx)
                .await?;
            }
            _ => {}
        }

        let (up_delta, down_delta) = transition.counter_deltas();
        if transition.added().is_some() {
            // First vote on an item creates its row with the increment already applied.
            sqlx::query(
                "INSERT INTO ratings (item_key, thumbs_up, thumbs_down, updated_at)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(item_key) DO UPDATE SET
                     thumbs_up = MAX(0, thumbs_up + ?),
                     thumbs_down = MAX(0, thumbs_down + ?),
                     updated_at = excluded.updated_at",
            )
            .bind(item_key.as_str())
            .bind(up_delta.max(0))
            .bind(down_delta.max(0))
            .bind(now)
            .bind(up_delta)
            .bind(down_delta)
            .execute(&mut *tx)
            .await?;
        } else if transition.removed().is_some() {
            sqlx::query(
                "UPDATE ratings SET
                     thumbs_up = MAX(0, thumbs_up + ?),
                     thumbs_down = MAX(0, thumbs_down + ?),
                     updated_at = ?
                 WHERE item_key = ?",
            )
            .bind(up_delta)
            .bind(down_delta)
            .bind(now)
            .bind(item_key.as_str())
            .execute(&mut *tx)
            .await?;
        }

        let summary = fetch_summary(&mut *tx, item_key, user_id).await?;
        tx.commit().await?;
        Ok(summary)
    }
}

#[async_trait]
impl StatsRepo for SqliteStore {
    async fn top_items(&self, limit: u32) -> StoreResult<Vec<ItemStats>> {
        let rows = sqlx::query_as::<_, StatsRow>(
            "SELECT item_key, thumbs_up, thumbs_down FROM ratings
             ORDER BY (thumbs_up + thumbs_down) DESC, item_key ASC
             LIMIT ?",
        )
        .bind(i64::from(clamp_limit(limit)))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ItemStats::try_from).collect()
    }
}

const SCHEMA_SQL: &str = r#"
-- Aggregate counters per item
CREATE TABLE IF NOT EXISTS ratings (
    item_key TEXT PRIMARY KEY,
    thumbs_up INTEGER NOT NULL DEFAULT 0 CHECK (thumbs_up >= 0),
    thumbs_down INTEGER NOT NULL DEFAULT 0 CHECK (thumbs_down >= 0),
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_ratings_total ON ratings((thumbs_up + thumbs_down) DESC);

-- Current vote per (item, user); no row means no vote
CREATE TABLE IF NOT EXISTS user_ratings (
    item_key TEXT NOT NULL,
    user_id TEXT NOT NULL,
    rating TEXT NOT NULL CHECK (rating IN ('up', 'down')),
    created_at TEXT NOT NULL,
    PRIMARY KEY (item_key, user_id)
);
"#;
