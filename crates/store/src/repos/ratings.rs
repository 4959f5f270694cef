//! Per-item, per-user rating repository trait.

use crate::error::StoreResult;
use async_trait::async_trait;
use tally_core::{ItemKey, RatingIntent, RatingSummary, UserId};

/// Repository for reading and writing votes.
#[async_trait]
pub trait RatingRepo: Send + Sync {
    /// Get the aggregate counters for an item and the user's current vote.
    /// Absent records read as zero counters and no vote.
    async fn get_rating(
        &self,
        item_key: &ItemKey,
        user_id: &UserId,
    ) -> StoreResult<RatingSummary>;

    /// Apply a vote intent and return the state read back after the write.
    ///
    /// The per-user record and the aggregate row change together or not at
    /// all. Repeating the same write toggles again, so callers must not
    /// retry blindly.
    async fn set_rating(
        &self,
        item_key: &ItemKey,
        user_id: &UserId,
        intent: RatingIntent,
    ) -> StoreResult<RatingSummary>;
}
