//! Rating read and toggle-write endpoints.

use crate::client::ClientIdentity;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::Value;
use tally_core::{ItemKey, RatingIntent, RatingSummary, Vote};
use tally_store::RatingRepo;

/// Query parameters naming the item.
#[derive(Debug, Deserialize)]
pub struct ItemQuery {
    pub item_key: Option<String>,
}

fn item_key_from_query(query: Result<Query<ItemQuery>, QueryRejection>) -> ApiResult<ItemKey> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let raw = query
        .item_key
        .ok_or_else(|| ApiError::BadRequest("missing item_key".to_string()))?;
    Ok(ItemKey::parse(&raw)?)
}

/// Decode a write body into an intent.
///
/// `{"rating": "up" | "down"}` sets or toggles, `{"rating": null}` clears.
/// A missing member, any other value, or a non-object body is rejected.
pub fn parse_rating_body(body: &[u8]) -> ApiResult<RatingIntent> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("body must be a JSON object".to_string()))?;

    match object.get("rating") {
        None => Err(ApiError::BadRequest("missing 'rating' field".to_string())),
        Some(Value::Null) => Ok(RatingIntent::Clear),
        Some(Value::String(s)) => Ok(RatingIntent::Set(s.parse::<Vote>()?)),
        Some(other) => Err(ApiError::BadRequest(format!(
            "'rating' must be \"up\", \"down\" or null, got {other}"
        ))),
    }
}

fn intent_label(intent: RatingIntent) -> &'static str {
    match intent {
        RatingIntent::Set(vote) => vote.as_str(),
        RatingIntent::Clear => "clear",
    }
}

/// GET /api/rating?item_key=
pub async fn get_rating(
    State(state): State<AppState>,
    ClientIdentity(user_id): ClientIdentity,
    query: Result<Query<ItemQuery>, QueryRejection>,
) -> ApiResult<Json<RatingSummary>> {
    let _timer = metrics::REQUEST_DURATION
        .with_label_values(&["rating_get"])
        .start_timer();

    let item_key = item_key_from_query(query)?;
    let summary = state.store.get_rating(&item_key, &user_id).await?;

    metrics::RATING_READS.inc();
    Ok(Json(summary))
}

/// POST /api/rating?item_key=
pub async fn set_rating(
    State(state): State<AppState>,
    ClientIdentity(user_id): ClientIdentity,
    query: Result<Query<ItemQuery>, QueryRejection>,
    body: Bytes,
) -> ApiResult<Json<RatingSummary>> {
    let _timer = metrics::REQUEST_DURATION
        .with_label_values(&["rating_post"])
        .start_timer();

    let parsed = item_key_from_query(query)
        .and_then(|item_key| parse_rating_body(&body).map(|intent| (item_key, intent)));
    let (item_key, intent) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            metrics::RATING_WRITES_REJECTED.inc();
            tracing::debug!(error = %e, "Rejected rating write");
            return Err(e);
        }
    };

    let summary = state.store.set_rating(&item_key, &user_id, intent).await?;

    metrics::record_rating_write(intent_label(intent));
    tracing::debug!(
        item_key = %item_key,
        intent = intent_label(intent),
        user_rating = ?summary.user_rating,
        "Rating updated"
    );
    Ok(Json(summary))
}
