//! Rating backends the CLI can talk to.

use crate::api_client::ApiClient;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tally_core::{ItemKey, ItemStats, RatingIntent, RatingSummary, UserId};
use tally_store::{RatingRepo, RatingStore, SqliteStore, StatsRepo};

/// Client configuration, selected by the `backend` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum ClientConfig {
    /// A tally server reached over HTTP.
    Remote { url: String },
    /// A SQLite database on this machine.
    Local {
        /// Defaults to `$XDG_DATA_HOME/tally/ratings.db`.
        #[serde(default)]
        path: Option<PathBuf>,
    },
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::Local { path: None }
    }
}

/// An open rating backend.
pub enum Backend {
    Remote(ApiClient),
    Local { store: SqliteStore, user_id: UserId },
}

impl Backend {
    pub async fn open(config: &ClientConfig) -> Result<Self> {
        match config {
            ClientConfig::Remote { url } => {
                tracing::debug!(url = %url, "Using remote rating backend");
                Ok(Self::Remote(ApiClient::new(url)?))
            }
            ClientConfig::Local { path } => {
                let path = match path {
                    Some(path) => path.clone(),
                    None => default_local_path()?,
                };
                tracing::debug!(path = %path.display(), "Using local rating backend");
                let store = SqliteStore::new(&path)
                    .await
                    .with_context(|| format!("failed to open {}", path.display()))?;
                Ok(Self::Local {
                    store,
                    user_id: local_user_id(),
                })
            }
        }
    }

    pub async fn get_rating(&self, item_key: &ItemKey) -> Result<RatingSummary> {
        match self {
            Self::Remote(client) => client.get_rating(item_key).await,
            Self::Local { store, user_id } => Ok(store.get_rating(item_key, user_id).await?),
        }
    }

    pub async fn set_rating(
        &self,
        item_key: &ItemKey,
        intent: RatingIntent,
    ) -> Result<RatingSummary> {
        match self {
            Self::Remote(client) => client.set_rating(item_key, intent).await,
            Self::Local { store, user_id } => {
                Ok(store.set_rating(item_key, user_id, intent).await?)
            }
        }
    }

    pub async fn stats(&self, limit: Option<u32>) -> Result<Vec<ItemStats>> {
        match self {
            Self::Remote(client) => client.stats(limit).await,
            Self::Local { store, .. } => Ok(store
                .top_items(limit.unwrap_or(tally_core::MAX_STATS_ITEMS))
                .await?),
        }
    }

    /// Describe backend health, failing when it is unreachable.
    pub async fn health(&self) -> Result<String> {
        match self {
            Self::Remote(client) => {
                let health = client.health().await?;
                Ok(format!("{} (server v{})", health.status, health.version))
            }
            Self::Local { store, .. } => {
                store.health_check().await?;
                Ok("ok (local)".to_string())
            }
        }
    }
}

/// The local user: one per account on this machine.
pub fn local_user_id() -> UserId {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok();
    UserId::derive(Some("local"), user.as_deref())
}

fn default_local_path() -> Result<PathBuf> {
    let base = match std::env::var_os("XDG_DATA_HOME") {
        Some(path) => PathBuf::from(path),
        None => {
            let home = std::env::var_os("HOME").ok_or_else(|| {
                anyhow::anyhow!("HOME not set; set a local path in the client config")
            })?;
            PathBuf::from(home).join(".local").join("share")
        }
    };
    Ok(base.join("tally").join("ratings.db"))
}
