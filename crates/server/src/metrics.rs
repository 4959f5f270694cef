//! Prometheus metrics for the tally server.
//!
//! Metrics carry no item keys or user ids, only aggregate counts and
//! latencies per route.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static RATING_READS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("tally_rating_reads_total", "Total number of rating reads")
        .expect("metric creation failed")
});

pub static RATING_WRITES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tally_rating_writes_total",
            "Total rating writes by requested intent",
        ),
        &["intent"],
    )
    .expect("metric creation failed")
});

pub static RATING_WRITES_REJECTED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "tally_rating_writes_rejected_total",
        "Total number of rating writes rejected as bad requests",
    )
    .expect("metric creation failed")
});

pub static STATS_REQUESTS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "tally_stats_requests_total",
        "Total number of leaderboard requests",
    )
    .expect("metric creation failed")
});

pub static REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tally_request_duration_seconds",
            "Time taken to handle an API request, by route",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["route"],
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Idempotent, so tests and embedded routers can call it freely.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(RATING_READS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(RATING_WRITES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(RATING_WRITES_REJECTED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(STATS_REQUESTS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(REQUEST_DURATION.clone()))
            .expect("metric registration failed");
    });
}

/// Record a completed write under its intent label.
pub fn record_rating_write(intent: &str) {
    RATING_WRITES.with_label_values(&[intent]).inc();
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        register_metrics();
        register_metrics();
    }

    #[test]
    fn test_rating_write_labels() {
        register_metrics();
        let before = RATING_WRITES.with_label_values(&["clear"]).get();
        record_rating_write("clear");
        assert_eq!(RATING_WRITES.with_label_values(&["clear"]).get(), before + 1);
    }
}
