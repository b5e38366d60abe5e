//! Error types for non-request plumbing (storage, configuration, upstream transport).
//!
//! Request-path failures use [`gateway_types::ProxyError`] instead.

use serde::Serialize;
use thiserror::Error;

/// Main error type for gateway infrastructure operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    /// Database operation failed (SQLite).
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Network request failed (HTTP client).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// File system I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage backend failed outside of the cases above (blocking task panicked, etc).
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

/// Result type alias for gateway infrastructure operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<gateway_types::ConfigError> for AppError {
    fn from(e: gateway_types::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Storage(format!("blocking task failed: {}", e))
    }
}
