//! Credential pool: fair round-robin selection with per-model cooldowns and auto-ban.
//!
//! Every mutating path goes through one pool-level lock. The credential set is
//! small (tens of records), so bookkeeping correctness wins over throughput.
//! Mutations bump a version counter that the persistence worker compares
//! against the last version it flushed.

mod admin;
mod outcome;
mod selection;

pub use admin::PoolStats;
pub use outcome::{CallOutcome, ReportEffect};
pub use selection::CredentialLease;

use gateway_types::models::{CredentialRecord, CredentialSnapshot, PoolConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;

/// Owned pool instance; constructed once at start-up and shared via `Arc`.
pub struct CredentialPool {
    state: Mutex<PoolState>,
    config: PoolConfig,
    flush_signal: Arc<Notify>,
}

pub(crate) struct PoolState {
    /// Insertion order doubles as rotation order.
    records: Vec<CredentialRecord>,
    cursor: usize,
    version: u64,
}

impl PoolState {
    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }
}

/// Full pool state captured for storage.
#[derive(Debug, Clone)]
pub struct PoolSnapshot {
    pub version: u64,
    pub records: Vec<CredentialSnapshot>,
    pub cursor: usize,
}

impl CredentialPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            state: Mutex::new(PoolState { records: Vec::new(), cursor: 0, version: 0 }),
            config,
            flush_signal: Arc::new(Notify::new()),
        }
    }

    /// Build a pool from stored snapshots.
    pub fn with_records(
        config: PoolConfig,
        records: Vec<CredentialRecord>,
        cursor: Option<usize>,
    ) -> Self {
        let pool = Self::new(config);
        pool.replace_all(records, cursor);
        pool
    }

    /// Replace the whole record set (used on load). Does not mark the pool dirty.
    pub fn replace_all(&self, records: Vec<CredentialRecord>, cursor: Option<usize>) {
        let mut state = self.state.lock();
        let len = records.len();
        state.records = records;
        // A lost or stale pointer only costs fairness, never correctness.
        state.cursor = match cursor {
            Some(c) if len > 0 => c % len,
            _ => 0,
        };
        tracing::info!("📊 Credential pool loaded with {} records", len);
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current mutation counter.
    pub fn version(&self) -> u64 {
        self.state.lock().version
    }

    pub fn cursor(&self) -> usize {
        self.state.lock().cursor
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        let state = self.state.lock();
        PoolSnapshot { version: state.version, records: state.records.clone(), cursor: state.cursor }
    }

    /// Snapshot only when something changed after `flushed_version`.
    pub fn snapshot_if_changed(&self, flushed_version: u64) -> Option<PoolSnapshot> {
        let state = self.state.lock();
        if state.version == flushed_version {
            return None;
        }
        Some(PoolSnapshot {
            version: state.version,
            records: state.records.clone(),
            cursor: state.cursor,
        })
    }

    /// Handle the persistence worker waits on for explicit flush requests.
    pub fn flush_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.flush_signal)
    }

    /// Ask the persistence worker to flush now instead of on its next tick.
    pub fn request_flush(&self) {
        self.flush_signal.notify_one();
    }

    /// Fetch a full record (payload included) by id.
    pub fn get(&self, id: &str) -> Option<CredentialRecord> {
        let state = self.state.lock();
        state.records.iter().find(|r| r.id == id).cloned()
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests;
