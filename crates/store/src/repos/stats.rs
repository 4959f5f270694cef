//! Leaderboard repository trait.

use crate::error::StoreResult;
use async_trait::async_trait;
use tally_core::{ItemStats, MAX_STATS_ITEMS};

/// Repository for aggregate statistics across items.
#[async_trait]
pub trait StatsRepo: Send + Sync {
    /// Items ordered by total votes, most voted first.
    /// `limit` is clamped to `1..=MAX_STATS_ITEMS`.
    async fn top_items(&self, limit: u32) -> StoreResult<Vec<ItemStats>>;
}

/// Clamp a requested leaderboard size.
pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_STATS_ITEMS)
}
