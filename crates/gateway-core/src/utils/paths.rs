use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

const DATA_DIR: &str = ".gemini_gateway";
const CONFIG_FILE: &str = "gateway_config.json";

static DATA_DIR_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

/// Pin the data directory for the rest of the process (`--data-dir`).
/// Only the first call has an effect.
pub fn set_data_dir(dir: PathBuf) {
    if DATA_DIR_OVERRIDE.set(dir).is_err() {
        tracing::debug!("Data directory already pinned, ignoring override");
    }
}

/// Get data directory path.
///
/// Priority:
/// 1. [`set_data_dir`] (CLI flag)
/// 2. `GATEWAY_DATA_DIR` environment variable (for container deployments)
/// 3. `~/.gemini_gateway`
pub fn get_data_dir() -> Result<PathBuf, String> {
    let data_dir = if let Some(dir) = DATA_DIR_OVERRIDE.get() {
        dir.clone()
    } else if let Ok(custom_dir) = std::env::var("GATEWAY_DATA_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = dirs::home_dir().ok_or("Cannot determine home directory")?;
        home.join(DATA_DIR)
    };

    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)
            .map_err(|e| format!("Failed to create data directory: {}", e))?;
    }

    Ok(data_dir)
}

/// Default file name for a storage backend inside the data directory.
pub fn default_storage_file(backend: gateway_types::models::StorageBackend) -> &'static str {
    use gateway_types::models::StorageBackend;
    match backend {
        StorageBackend::JsonFile => "credentials.json",
        StorageBackend::Sqlite => "credentials.db",
        StorageBackend::Memory => "",
    }
}

/// Default config file location.
pub fn default_config_path() -> Result<PathBuf, String> {
    Ok(get_data_dir()?.join(CONFIG_FILE))
}
