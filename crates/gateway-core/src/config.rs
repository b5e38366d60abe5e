//! Loading and saving the gateway configuration file.

use gateway_types::models::GatewayConfig;
use std::fs;
use std::path::Path;

use crate::error::{AppError, AppResult};

/// Read the configuration at `path`. A missing file means defaults.
///
/// The result is not validated yet: callers apply their overrides first and
/// call [`GatewayConfig::validated`] afterwards.
pub fn load_config(path: &Path) -> AppResult<GatewayConfig> {
    if !path.exists() {
        tracing::info!("No config at {}, using defaults", path.display());
        return Ok(GatewayConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let config = GatewayConfig::from_json_str(&content)?;
    tracing::info!("📄 Loaded config from {}", path.display());
    Ok(config)
}

/// Write `config` as pretty JSON, replacing the file atomically.
pub fn save_config(path: &Path, config: &GatewayConfig) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(config)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path).map_err(AppError::Io)
}
