//! Rating store abstraction and implementations for tally.
//!
//! This crate persists two kinds of records:
//! - Aggregate up/down counters per item
//! - Each user's current vote per item
//!
//! Writes go through the toggle state machine in [`tally_core::rating`],
//! applied atomically inside one database transaction.

pub mod error;
pub mod models;
pub mod postgres;
pub mod repos;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use postgres::PostgresStore;
pub use repos::{RatingRepo, StatsRepo};
pub use store::{RatingStore, SqliteStore};

use std::sync::Arc;
use tally_core::config::StoreConfig;

/// Create a rating store from configuration.
pub async fn from_config(config: &StoreConfig) -> StoreResult<Arc<dyn RatingStore>> {
    config.validate().map_err(StoreError::Config)?;

    match config {
        StoreConfig::Sqlite { path } => {
            tracing::info!(path = %path.display(), "Opening local SQLite rating store");
            let store = SqliteStore::new(path).await?;
            Ok(Arc::new(store) as Arc<dyn RatingStore>)
        }
        StoreConfig::Postgres {
            url,
            host,
            port,
            username,
            password,
            database,
            ssl_mode,
            max_connections,
            statement_timeout_ms,
        } => {
            let store = if let Some(url) = url {
                tracing::info!("Connecting to PostgreSQL using connection URL");
                PostgresStore::from_url(url, *max_connections, *statement_timeout_ms).await?
            } else if let (Some(host), Some(database)) = (host.as_ref(), database.as_ref()) {
                PostgresStore::from_params(
                    host,
                    port.unwrap_or(5432),
                    username.as_deref(),
                    password.as_deref(),
                    database,
                    *ssl_mode,
                    *max_connections,
                    *statement_timeout_ms,
                )
                .await?
            } else {
                return Err(StoreError::Config(
                    "postgres config requires either 'url' or 'host' + 'database'".to_string(),
                ));
            };
            Ok(Arc::new(store) as Arc<dyn RatingStore>)
        }
    }
}
