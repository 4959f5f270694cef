//! HTTP request handlers.

pub mod health;
pub mod ratings;
pub mod stats;

pub use health::*;
pub use ratings::*;
pub use stats::*;

use crate::error::ApiError;

/// GET/POST to an unknown route.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("no such route".to_string())
}
