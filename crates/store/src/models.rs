//! Database models mapping to the rating schema.

use crate::error::{StoreError, StoreResult};
use sqlx::FromRow;
use tally_core::{ItemKey, ItemStats, Tally, Vote};
use time::OffsetDateTime;

/// Aggregate counters for one item.
#[derive(Debug, Clone, FromRow)]
pub struct RatingRow {
    pub item_key: String,
    pub thumbs_up: i64,
    pub thumbs_down: i64,
    pub updated_at: OffsetDateTime,
}

impl RatingRow {
    pub fn tally(&self) -> Tally {
        Tally::new(clamp_count(self.thumbs_up), clamp_count(self.thumbs_down))
    }
}

/// One user's current vote on one item.
#[derive(Debug, Clone, FromRow)]
pub struct UserRatingRow {
    pub item_key: String,
    pub user_id: String,
    pub rating: String,
    pub created_at: OffsetDateTime,
}

impl UserRatingRow {
    pub fn vote(&self) -> StoreResult<Vote> {
        parse_stored_vote(&self.rating)
    }
}

/// Leaderboard projection of the ratings table.
#[derive(Debug, Clone, FromRow)]
pub struct StatsRow {
    pub item_key: String,
    pub thumbs_up: i64,
    pub thumbs_down: i64,
}

impl TryFrom<StatsRow> for ItemStats {
    type Error = StoreError;

    fn try_from(row: StatsRow) -> StoreResult<Self> {
        let item_key = ItemKey::parse(&row.item_key)
            .map_err(|e| StoreError::Internal(format!("stored item key is invalid: {e}")))?;
        Ok(Self {
            item_key,
            thumbs_up: clamp_count(row.thumbs_up),
            thumbs_down: clamp_count(row.thumbs_down),
        })
    }
}

/// Decode a vote column value.
pub(crate) fn parse_stored_vote(value: &str) -> StoreResult<Vote> {
    value
        .parse()
        .map_err(|e| StoreError::Internal(format!("stored rating is invalid: {e}")))
}

/// Counters are non-negative by schema constraint; clamp anyway when widening.
pub(crate) fn clamp_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
