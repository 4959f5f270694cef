//! Leaderboard endpoint.

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::Deserialize;
use tally_core::{ItemStats, MAX_STATS_ITEMS};
use tally_store::StatsRepo;

/// Query parameters for the leaderboard.
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub limit: Option<u32>,
}

/// GET /api/stats
pub async fn get_stats(
    State(state): State<AppState>,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ItemStats>>> {
    let _timer = metrics::REQUEST_DURATION
        .with_label_values(&["stats"])
        .start_timer();
    metrics::STATS_REQUESTS.inc();

    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let limit = query.limit.unwrap_or(MAX_STATS_ITEMS);

    let items = state.store.top_items(limit).await?;
    Ok(Json(items))
}
