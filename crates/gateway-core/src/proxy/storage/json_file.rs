use async_trait::async_trait;
use gateway_types::models::CredentialSnapshot;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::StorageAdapter;
use crate::error::AppResult;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    cursor: Option<usize>,
    #[serde(default)]
    credentials: Vec<CredentialSnapshot>,
}

/// One JSON document holding every record, replaced atomically on save.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> AppResult<StoreFile> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(StoreFile::default()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_file(&self, file: &StoreFile) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(file)?;

        if let Err(e) = tokio::fs::write(&temp_path, content).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for JsonFileStorage {
    async fn load_all(&self) -> AppResult<Vec<CredentialSnapshot>> {
        Ok(self.read_file().await?.credentials)
    }

    async fn save_all(&self, records: &[CredentialSnapshot]) -> AppResult<()> {
        let cursor = self.read_file().await.ok().and_then(|f| f.cursor);
        self.write_file(&StoreFile { cursor, credentials: records.to_vec() }).await
    }

    async fn load_cursor(&self) -> AppResult<Option<usize>> {
        Ok(self.read_file().await?.cursor)
    }

    async fn save_cursor(&self, cursor: usize) -> AppResult<()> {
        let mut file = self.read_file().await?;
        if file.cursor == Some(cursor) {
            return Ok(());
        }
        file.cursor = Some(cursor);
        self.write_file(&file).await
    }

    fn backend_name(&self) -> &'static str {
        "json_file"
    }
}
