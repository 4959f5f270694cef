#[path = "../src/api_client.rs"]
#[allow(dead_code)] // Some items are used by the binary but not by tests
mod api_client;

use api_client::ApiClient;
use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use serde_json::json;
use std::net::TcpListener;
use tally_core::{ItemIdentity, RatingIntent, Vote};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

#[tokio::test]
async fn api_client_rating_round_trip() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let key = ItemIdentity::new("What do you call a fake noodle?", "An impasta.").key();

    let get_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/rating")
            .query_param("item_key", key.as_str())
            .header_exists("user-agent");
        then.status(200)
            .json_body(json!({"thumbs_up": 4, "thumbs_down": 1, "user_rating": null}));
    });

    let vote_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/rating")
            .query_param("item_key", key.as_str())
            .json_body(json!({"rating": "up"}));
        then.status(200)
            .json_body(json!({"thumbs_up": 5, "thumbs_down": 1, "user_rating": "up"}));
    });

    let clear_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/rating")
            .query_param("item_key", key.as_str())
            .json_body(json!({"rating": null}));
        then.status(200)
            .json_body(json!({"thumbs_up": 4, "thumbs_down": 1, "user_rating": null}));
    });

    let client = ApiClient::new(&server.base_url()).unwrap();

    let summary = client.get_rating(&key).await.unwrap();
    assert_eq!((summary.thumbs_up, summary.thumbs_down), (4, 1));
    assert_eq!(summary.user_rating, None);

    let summary = client
        .set_rating(&key, RatingIntent::Set(Vote::Up))
        .await
        .unwrap();
    assert_eq!(summary.thumbs_up, 5);
    assert_eq!(summary.user_rating, Some(Vote::Up));

    let summary = client.set_rating(&key, RatingIntent::Clear).await.unwrap();
    assert_eq!(summary.user_rating, None);

    get_mock.assert();
    vote_mock.assert();
    clear_mock.assert();
}

#[tokio::test]
async fn api_client_stats_and_health() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();

    let stats_mock = server.mock(|when, then| {
        when.method(GET).path("/api/stats").query_param("limit", "2");
        then.status(200).json_body(json!([
            {"item_key": "joke-b", "thumbs_up": 7, "thumbs_down": 2},
            {"item_key": "joke-a", "thumbs_up": 1, "thumbs_down": 0}
        ]));
    });

    server.mock(|when, then| {
        when.method(GET).path("/api/health");
        then.status(200)
            .json_body(json!({"status": "ok", "version": "0.1.0"}));
    });

    let client = ApiClient::new(&server.base_url()).unwrap();

    let stats = client.stats(Some(2)).await.unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].item_key.as_str(), "joke-b");
    assert_eq!(stats[0].total(), 9);
    stats_mock.assert();

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, "0.1.0");
}

#[tokio::test]
async fn api_client_surfaces_server_errors() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/api/rating");
        then.status(400).json_body(json!({
            "code": "bad_request",
            "message": "bad request: missing item_key"
        }));
    });

    server.mock(|when, then| {
        when.method(GET).path("/api/stats");
        then.status(500).json_body(json!({
            "code": "store_error",
            "message": "store error: database is locked"
        }));
    });

    let client = ApiClient::new(&server.base_url()).unwrap();
    let key = ItemIdentity::new("q", "a").key();

    let err = client
        .set_rating(&key, RatingIntent::Set(Vote::Down))
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("400"), "{message}");
    assert!(message.contains("bad_request"), "{message}");

    let err = client.stats(None).await.unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[test]
fn api_client_rejects_invalid_url() {
    assert!(ApiClient::new("not a url").is_err());
}
