//! PostgreSQL-based rating store implementation.

use crate::error::StoreResult;
use crate::models::{RatingRow, StatsRow, UserRatingRow};
use crate::repos::stats::clamp_limit;
use crate::repos::{RatingRepo, StatsRepo};
use crate::store::RatingStore;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPoolOptions, PgSslMode as SqlxPgSslMode};
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use tally_core::config::PgSslMode;
use tally_core::{ItemKey, ItemStats, RatingIntent, RatingSummary, Transition, UserId};
use time::OffsetDateTime;

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

fn postgres_schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

/// PostgreSQL-based rating store for shared, remote deployments.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection URL.
    pub async fn from_url(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> StoreResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    /// Create a new PostgreSQL store from individual connection parameters.
    #[allow(clippy::too_many_arguments)]
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        ssl_mode: Option<PgSslMode>,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> StoreResult<Self> {
        let mut opts = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);

        if let Some(user) = username {
            opts = opts.username(user);
        }

        if let Some(pass) = password {
            opts = opts.password(pass);
        }

        if let Some(mode) = ssl_mode {
            let sqlx_mode = match mode {
                PgSslMode::Disable => SqlxPgSslMode::Disable,
                PgSslMode::Prefer => SqlxPgSslMode::Prefer,
                PgSslMode::Require => SqlxPgSslMode::Require,
            };
            opts = opts.ssl_mode(sqlx_mode);
        }

        // Never log the password
        tracing::info!(
            host = host,
            port = port,
            database = database,
            username = username.unwrap_or("<none>"),
            ssl_mode = ?ssl_mode,
            "Connecting to PostgreSQL with individual parameters"
        );

        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    async fn connect(
        mut opts: PgConnectOptions,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> StoreResult<Self> {
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
impl RatingStore for PostgresStore {
    async fn migrate(&self) -> StoreResult<()> {
        // Prepared statements cannot hold several commands, so run them one by one.
        for statement in postgres_schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

async fn fetch_summary(
    conn: &mut PgConnection,
    item_key: &ItemKey,
    user_id: &UserId,
) -> StoreResult<RatingSummary> {
    let aggregate = sqlx::query_as::<_, RatingRow>("SELECT * FROM ratings WHERE item_key = $1")
        .bind(item_key.as_str())
        .fetch_optional(&mut *conn)
        .await?;

    let user_rating = sqlx::query_as::<_, UserRatingRow>(
        "SELECT * FROM user_ratings WHERE item_key = $1 AND user_id = $2",
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
impl RatingRepo for PostgresStore {
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

        // Lock the user's row so concurrent writes from the same user serialize.
        let current = sqlx::query_as::<_, UserRatingRow>(
            "SELECT * FROM user_ratings WHERE item_key = $1 AND user_id = $2 FOR UPDATE",
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
                    "INSERT INTO user_ratings (item_key, user_id, rating, created_at) VALUES ($1, $2, $3, $4)",
                )
                .bind(item_key.as_str())
                .bind(user_id.as_str())
                .bind(vote.as_str())
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }
            (Some(_), None) => {
                sqlx::query("DELETE FROM user_ratings WHERE item_key = $1 AND user_id = $2")
                    .bind(item_key.as_str())
                    .bind(user_id.as_str())
                    .execute(&mut *tx)
                    .await?;
            }
            (Some(previous), Some(vote)) if previous != vote => {
                sqlx::query(
                    "UPDATE user_ratings SET rating = $1, created_at = $2 WHERE item_key = $3 AND user_id = $4",
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
            sqlx::query(
                "INSERT INTO ratings (item_key, thumbs_up, thumbs_down, updated_at)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (item_key) DO UPDATE SET
                     thumbs_up = GREATEST(0, ratings.thumbs_up + $5),
                     thumbs_down = GREATEST(0, ratings.thumbs_down + $6),
                     updated_at = EXCLUDED.updated_at",
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
                     thumbs_up = GREATEST(0, thumbs_up + $1),
                     thumbs_down = GREATEST(0, thumbs_down + $2),
                     updated_at = $3
                 WHERE item_key = $4",
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
impl StatsRepo for PostgresStore {
    async fn top_items(&self, limit: u32) -> StoreResult<Vec<ItemStats>> {
        let rows = sqlx::query_as::<_, StatsRow>(
            "SELECT item_key, thumbs_up, thumbs_down FROM ratings
             ORDER BY (thumbs_up + thumbs_down) DESC, item_key ASC
             LIMIT $1",
        )
        .bind(i64::from(clamp_limit(limit)))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ItemStats::try_from).collect()
    }
}
