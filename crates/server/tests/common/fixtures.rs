//! Test fixtures for rating requests.

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tally_core::ItemIdentity;
use tower::ServiceExt;

/// A few items the way a client would derive keys for them.
#[allow(dead_code)]
pub fn sample_items() -> Vec<ItemIdentity> {
    vec![
        ItemIdentity::new(
            "Why don't skeletons fight each other?",
            "They don't have the guts.",
        ),
        ItemIdentity::new("What do you call a fake noodle?", "An impasta."),
        ItemIdentity::new("Why did the scarecrow win an award?", "He was outstanding in his field."),
    ]
}

/// Key of the first sample item, ready for a query string.
#[allow(dead_code)]
pub fn sample_key() -> String {
    sample_items()[0].key().to_string()
}

/// A response captured for assertions.
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Send a request through the router as the client identified by `user_agent`.
///
/// `body` is sent verbatim so tests can exercise malformed payloads.
#[allow(dead_code)]
pub async fn send(
    router: &axum::Router,
    method: &str,
    uri: &str,
    user_agent: &str,
    body: Option<&str>,
    extra_headers: &[(&str, &str)],
) -> TestResponse {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("User-Agent", user_agent);

    for (name, value) in extra_headers {
        builder = builder.header(*name, *value);
    }

    let body = match body {
        Some(raw) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(raw.to_string())
        }
        None => Body::empty(),
    };

    let request = builder.body(body).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let body: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    TestResponse {
        status,
        headers,
        body,
    }
}
