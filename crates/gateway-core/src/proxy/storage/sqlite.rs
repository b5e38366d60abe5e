use async_trait::async_trait;
use gateway_types::models::CredentialSnapshot;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::Arc;

use super::StorageAdapter;
use crate::error::AppResult;

/// SQLite-backed storage. Each record is one row keyed by id, stored as JSON
/// with a position column preserving rotation order.
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    pub fn open(path: PathBuf) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> AppResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS credentials (
                id TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                data TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS pool_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    async fn with_conn<T, F>(&self, f: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> AppResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await?
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn load_all(&self) -> AppResult<Vec<CredentialSnapshot>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, data FROM credentials ORDER BY position ASC")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

            let mut records = Vec::new();
            for row in rows {
                let (id, data) = row?;
                match serde_json::from_str::<CredentialSnapshot>(&data) {
                    Ok(record) => records.push(record),
                    Err(e) => tracing::warn!("Skipping unreadable credential row {}: {}", id, e),
                }
            }
            Ok(records)
        })
        .await
    }

    async fn save_all(&self, records: &[CredentialSnapshot]) -> AppResult<()> {
        let encoded = records
            .iter()
            .map(|r| Ok((r.id.clone(), serde_json::to_string(r)?)))
            .collect::<Result<Vec<_>, serde_json::Error>>()?;

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM credentials", [])?;
            {
                let mut insert =
                    tx.prepare("INSERT INTO credentials (id, position, data) VALUES (?1, ?2, ?3)")?;
                for (position, (id, data)) in encoded.iter().enumerate() {
                    let _rows = insert.execute(params![id, position as i64, data])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn load_cursor(&self) -> AppResult<Option<usize>> {
        self.with_conn(|conn| {
            let value: Option<String> = conn
                .query_row("SELECT value FROM pool_meta WHERE key = 'cursor'", [], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value.and_then(|v| v.parse().ok()))
        })
        .await
    }

    async fn save_cursor(&self, cursor: usize) -> AppResult<()> {
        self.with_conn(move |conn| {
            let _rows = conn.execute(
                "INSERT INTO pool_meta (key, value) VALUES ('cursor', ?1)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![cursor.to_string()],
            )?;
            Ok(())
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
