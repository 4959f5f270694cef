//! Application state shared across handlers.

use std::sync::Arc;
use tally_core::config::AppConfig;
use tally_store::RatingStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Rating store backend.
    pub store: Arc<dyn RatingStore>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: AppConfig, store: Arc<dyn RatingStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}
