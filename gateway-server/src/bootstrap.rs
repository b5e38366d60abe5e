//! Configuration resolution and pool start-up shared by every subcommand.

use anyhow::{Context, Result};
use gateway_core::proxy::{create_storage, restore_pool, CredentialPool, StorageAdapter};
use gateway_core::utils::paths;
use gateway_types::models::GatewayConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::{Cli, ServeArgs};

/// Where the config file lives: `--config`, else `<data-dir>/gateway_config.json`.
pub fn config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => paths::default_config_path().map_err(|e| anyhow::anyhow!(e)),
    }
}

/// File, then CLI/env overrides, then validation.
pub fn resolve_config(path: &Path, overrides: &ServeArgs) -> Result<GatewayConfig> {
    let mut config = gateway_core::config::load_config(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    apply_overrides(&mut config, overrides);
    config.validated().context("Invalid configuration")
}

pub fn apply_overrides(config: &mut GatewayConfig, overrides: &ServeArgs) {
    if let Some(host) = &overrides.host {
        config.server.host = host.clone();
    }
    if let Some(port) = overrides.port {
        config.server.port = port;
    }
    if let Some(key) = overrides.api_key.as_ref().filter(|k| !k.is_empty()) {
        config.server.api_key = Some(key.clone());
    }
    if let Some(key) = overrides.admin_key.as_ref().filter(|k| !k.is_empty()) {
        config.server.admin_key = Some(key.clone());
    }
}

/// Open the configured backend and load its records into a pool.
pub async fn open_pool(config: &GatewayConfig) -> Result<(Arc<dyn StorageAdapter>, Arc<CredentialPool>)> {
    let storage = create_storage(&config.persistence).context("Failed to open credential storage")?;
    let pool = restore_pool(storage.as_ref(), config.pool.clone())
        .await
        .with_context(|| format!("Failed to load credentials from {} storage", storage.backend_name()))?;
    Ok((storage, Arc::new(pool)))
}

/// Copy of `config` safe to print: keys replaced by a mask.
pub fn masked(config: &GatewayConfig) -> GatewayConfig {
    let mut shown = config.clone();
    let mask = |key: &mut Option<String>| {
        if key.is_some() {
            *key = Some("********".to_string());
        }
    };
    mask(&mut shown.server.api_key);
    mask(&mut shown.server.admin_key);
    shown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_then_overrides() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let overrides = ServeArgs {
            host: Some("0.0.0.0".to_string()),
            port: Some(9100),
            api_key: Some("sk-test".to_string()),
            admin_key: Some(String::new()),
        };
        let config = resolve_config(&dir.path().join("absent.json"), &overrides).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(config.server.get_socket_addr(), "0.0.0.0:9100");
        assert_eq!(config.server.api_key.as_deref(), Some("sk-test"));
        assert!(config.server.admin_key.is_none());
    }

    #[test]
    fn test_file_values_survive_without_overrides() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("gateway_config.json");
        std::fs::write(&path, r#"{"server": {"port": 7001}, "retry": {"max_retries": 2}}"#)
            .unwrap_or_else(|e| panic!("{e}"));
        let config = resolve_config(&path, &ServeArgs::default()).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(config.server.port, 7001);
        assert_eq!(config.retry.max_retries, 2);
    }

    #[test]
    fn test_invalid_file_aborts() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("gateway_config.json");
        std::fs::write(&path, r#"{"pool": {"calls_per_rotation": 0}}"#).unwrap_or_else(|e| panic!("{e}"));
        assert!(resolve_config(&path, &ServeArgs::default()).is_err());
    }

    #[test]
    fn test_masked_hides_keys() {
        let mut config = GatewayConfig::default();
        config.server.api_key = Some("secret".to_string());
        let shown = masked(&config);
        assert_eq!(shown.server.api_key.as_deref(), Some("********"));
        assert!(shown.server.admin_key.is_none());
    }
}
