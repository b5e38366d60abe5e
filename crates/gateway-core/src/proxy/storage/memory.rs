use async_trait::async_trait;
use gateway_types::models::CredentialSnapshot;
use parking_lot::Mutex;

use super::StorageAdapter;
use crate::error::AppResult;

/// Process-local storage; state is lost on exit.
#[derive(Default)]
pub struct MemoryStorage {
    records: Mutex<Vec<CredentialSnapshot>>,
    cursor: Mutex<Option<usize>>,
    saves: Mutex<u64>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<CredentialSnapshot>) -> Self {
        Self { records: Mutex::new(records), ..Self::default() }
    }

    /// Number of `save_all` calls seen so far.
    pub fn save_count(&self) -> u64 {
        *self.saves.lock()
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn load_all(&self) -> AppResult<Vec<CredentialSnapshot>> {
        Ok(self.records.lock().clone())
    }

    async fn save_all(&self, records: &[CredentialSnapshot]) -> AppResult<()> {
        *self.records.lock() = records.to_vec();
        *self.saves.lock() += 1;
        Ok(())
    }

    async fn load_cursor(&self) -> AppResult<Option<usize>> {
        Ok(*self.cursor.lock())
    }

    async fn save_cursor(&self, cursor: usize) -> AppResult<()> {
        *self.cursor.lock() = Some(cursor);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
