//! Storage adapters for the credential pool.
//!
//! Every save is a full snapshot of the pool; backends replace what they held
//! before instead of merging. The rotation pointer is stored alongside when
//! the backend supports it.

mod json_file;
mod memory;
mod sqlite;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use gateway_types::models::{CredentialSnapshot, PersistenceConfig, StorageBackend};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::utils::paths;

/// Key/value store for credential snapshots.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Load every stored record, in rotation order.
    async fn load_all(&self) -> AppResult<Vec<CredentialSnapshot>>;

    /// Replace stored records with `records`.
    async fn save_all(&self, records: &[CredentialSnapshot]) -> AppResult<()>;

    /// Stored rotation pointer, if the backend keeps one.
    async fn load_cursor(&self) -> AppResult<Option<usize>> {
        Ok(None)
    }

    async fn save_cursor(&self, _cursor: usize) -> AppResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str;
}

/// Build the configured backend. Relative paths resolve under the data directory.
pub fn create_storage(config: &PersistenceConfig) -> AppResult<Arc<dyn StorageAdapter>> {
    if config.backend == StorageBackend::Memory {
        return Ok(Arc::new(MemoryStorage::new()));
    }

    let path = match &config.path {
        Some(p) if PathBuf::from(p).is_absolute() => PathBuf::from(p),
        Some(p) => paths::get_data_dir().map_err(AppError::Config)?.join(p),
        None => paths::get_data_dir()
            .map_err(AppError::Config)?
            .join(paths::default_storage_file(config.backend)),
    };

    tracing::info!("💾 Credential storage: {} at {}", config.backend, path.display());
    let storage: Arc<dyn StorageAdapter> = match config.backend {
        StorageBackend::Sqlite => Arc::new(SqliteStorage::open(path)?),
        _ => Arc::new(JsonFileStorage::new(path)),
    };
    Ok(storage)
}
