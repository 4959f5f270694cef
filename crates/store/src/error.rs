//! Rating store error types.

use thiserror::Error;

/// Rating store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
