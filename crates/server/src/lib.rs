//! HTTP API server for tally.
//!
//! This crate provides the HTTP surface over a rating store:
//! - Per-user rating reads and toggle writes
//! - Leaderboard of the most-voted items
//! - Health and Prometheus endpoints

pub mod client;
pub mod cors;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

pub use client::ClientIdentity;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
