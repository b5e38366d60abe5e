//! Gateway configuration models.

mod features;
mod pool;
mod server;

pub use features::{AntiTruncationConfig, PersistenceConfig, StorageBackend};
pub use pool::{AutoBanConfig, PoolConfig, RetryConfig};
pub use server::{default_base_url, ServerConfig, UpstreamConfig};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ConfigError;

/// Full gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct GatewayConfig {
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,
    #[serde(default)]
    #[validate(nested)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    #[validate(nested)]
    pub pool: PoolConfig,
    #[serde(default)]
    #[validate(nested)]
    pub retry: RetryConfig,
    #[serde(default)]
    #[validate(nested)]
    pub anti_truncation: AntiTruncationConfig,
    #[serde(default)]
    #[validate(nested)]
    pub persistence: PersistenceConfig,
    /// Base model names advertised on the model list routes
    #[serde(default = "default_models")]
    pub models: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            pool: PoolConfig::default(),
            retry: RetryConfig::default(),
            anti_truncation: AntiTruncationConfig::default(),
            persistence: PersistenceConfig::default(),
            models: default_models(),
        }
    }
}

impl GatewayConfig {
    /// Parse a JSON document; missing sections fall back to defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::from_json_error(&e))
    }

    /// Run the `validator` rules over every section.
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate().map_err(|e| ConfigError::from_validation(&e))?;
        if self.anti_truncation.min_overlap_chars > self.anti_truncation.max_overlap_chars {
            return Err(ConfigError::ValidationError {
                field: "anti_truncation.min_overlap_chars".to_string(),
                message: "must not exceed max_overlap_chars".to_string(),
            });
        }
        Ok(self)
    }
}

fn default_models() -> Vec<String> {
    ["gemini-2.5-pro", "gemini-2.5-flash", "gemini-3-pro-preview", "gemini-3-flash-preview"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = GatewayConfig::from_json_str("{}").unwrap().validated().unwrap();
        assert_eq!(config.server.port, 8045);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.interval_ms, 100);
        assert_eq!(config.anti_truncation.max_attempts, 3);
        assert_eq!(config.pool.auto_ban.codes, vec![403]);
        assert!(!config.pool.auto_ban.enabled);
        assert_eq!(config.persistence.backend, StorageBackend::JsonFile);
        assert_eq!(config.models.len(), 4);
    }

    #[test]
    fn test_partial_section_override() {
        let raw = r#"{"pool": {"calls_per_rotation": 3, "auto_ban": {"enabled": true}}}"#;
        let config = GatewayConfig::from_json_str(raw).unwrap();
        assert_eq!(config.pool.calls_per_rotation, 3);
        assert!(config.pool.auto_ban.enabled);
        assert_eq!(config.pool.auto_ban.threshold, 1);
        assert_eq!(config.pool.default_cooldown_secs, 60);
    }

    #[test]
    fn test_zero_rotation_is_rejected() {
        let raw = r#"{"pool": {"calls_per_rotation": 0}}"#;
        let err = GatewayConfig::from_json_str(raw).unwrap().validated().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_overlap_bounds_checked() {
        let raw = r#"{"anti_truncation": {"min_overlap_chars": 50, "max_overlap_chars": 10}}"#;
        let err = GatewayConfig::from_json_str(raw).unwrap().validated().unwrap_err();
        assert!(err.to_string().contains("min_overlap_chars"));
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let err = GatewayConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }
}
