//! Core domain models for the gateway.

mod config;
mod credential;

pub use config::{
    default_base_url, AntiTruncationConfig, AutoBanConfig, GatewayConfig, PersistenceConfig,
    PoolConfig, RetryConfig, ServerConfig, StorageBackend, UpstreamConfig,
};
pub use credential::{CredentialRecord, CredentialSnapshot, CredentialSummary, MAX_ERROR_HISTORY};
