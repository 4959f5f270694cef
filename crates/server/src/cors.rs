//! Permissive cross-origin headers.
//!
//! Every response carries the same CORS headers, and any `OPTIONS` request
//! is answered with an empty 200 before routing so preflight never 404s
//! or 405s.

use crate::state::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type";

/// Middleware adding CORS headers and answering preflight requests.
pub async fn cors_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(req).await
    };

    apply_cors_headers(response.headers_mut(), &state.config.server.cors_allow_origin);
    response
}

fn apply_cors_headers(headers: &mut HeaderMap, allow_origin: &str) {
    let origin = HeaderValue::from_str(allow_origin).unwrap_or_else(|_| {
        tracing::warn!(
            allow_origin,
            "cors_allow_origin is not a valid header value, using \"*\""
        );
        HeaderValue::from_static("*")
    });
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}
