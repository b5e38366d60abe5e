//! Background flushing of credential-pool mutations to storage.
//!
//! One task owns the writer side of the [`StorageAdapter`]. It wakes on a
//! timer tick or on an explicit flush request, compares the pool's mutation
//! counter with the last flushed one and writes a full snapshot when they
//! differ. Request handlers never wait on it.

use gateway_types::models::PersistenceConfig;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::AppResult;
use crate::proxy::credential_pool::CredentialPool;
use crate::proxy::storage::StorageAdapter;

pub struct PersistenceWorker {
    pool: Arc<CredentialPool>,
    storage: Arc<dyn StorageAdapter>,
    interval: Duration,
    drain_timeout: Duration,
    /// Version of the last snapshot that reached storage. Held across the
    /// write so two flushes never interleave.
    flushed_version: tokio::sync::Mutex<u64>,
    last_cursor: Mutex<Option<usize>>,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PersistenceWorker {
    /// The pool's current version counts as already flushed (it was just loaded).
    pub fn new(
        pool: Arc<CredentialPool>,
        storage: Arc<dyn StorageAdapter>,
        config: &PersistenceConfig,
    ) -> Arc<Self> {
        let (shutdown_tx, _) = watch::channel(false);
        let flushed = pool.version();
        let cursor = pool.cursor();
        Arc::new(Self {
            pool,
            storage,
            interval: Duration::from_secs(config.flush_interval_secs.max(1)),
            drain_timeout: Duration::from_secs(config.drain_timeout_secs),
            flushed_version: tokio::sync::Mutex::new(flushed),
            last_cursor: Mutex::new(Some(cursor)),
            shutdown_tx,
            task: Mutex::new(None),
        })
    }

    /// Spawn the flush loop. Calling it twice keeps the first task.
    pub fn start(self: &Arc<Self>) {
        let mut slot = self.task.lock();
        if slot.is_some() {
            return;
        }

        let worker = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let flush_signal = self.pool.flush_signal();

        *slot = Some(tokio::spawn(async move {
            tracing::info!(
                "💾 Persistence worker started ({} backend, every {}s)",
                worker.storage.backend_name(),
                worker.interval.as_secs()
            );
            loop {
                tokio::select! {
                    () = tokio::time::sleep(worker.interval) => {}
                    () = flush_signal.notified() => {
                        tracing::debug!("Flush requested");
                    }
                    _ = shutdown_rx.changed() => break,
                }
                // A write still running when shutdown arrives is abandoned;
                // the final drain in `shutdown` retries it under its deadline.
                tokio::select! {
                    result = worker.flush_once() => {
                        if let Err(e) = result {
                            tracing::warn!("⚠️ Credential flush failed, retrying next tick: {}", e);
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
        }));
    }

    /// Write the current snapshot if the pool changed since the last flush.
    ///
    /// Returns whether anything was written.
    pub async fn flush_once(&self) -> AppResult<bool> {
        let mut flushed = self.flushed_version.lock().await;
        let Some(snapshot) = self.pool.snapshot_if_changed(*flushed) else {
            return Ok(false);
        };

        self.storage.save_all(&snapshot.records).await?;

        let cursor_changed = *self.last_cursor.lock() != Some(snapshot.cursor);
        if cursor_changed {
            match self.storage.save_cursor(snapshot.cursor).await {
                Ok(()) => *self.last_cursor.lock() = Some(snapshot.cursor),
                Err(e) => tracing::debug!("Rotation pointer not saved: {}", e),
            }
        }

        *flushed = snapshot.version;
        tracing::debug!(
            "💾 Flushed {} credentials (version {})",
            snapshot.records.len(),
            snapshot.version
        );
        Ok(true)
    }

    /// Stop the loop, then drain once. Joining the loop and the final write
    /// share one `drain_timeout` deadline.
    ///
    /// Never fails: a drain that times out or a loop task that was already
    /// cancelled is an ordinary way to exit.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let deadline = tokio::time::Instant::now() + self.drain_timeout;

        let handle = self.task.lock().take();
        if let Some(mut handle) = handle {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => {},
                Ok(Err(e)) if e.is_cancelled() => {
                    tracing::debug!("Persistence worker was cancelled while waiting");
                },
                Ok(Err(e)) => tracing::warn!("Persistence worker task failed: {}", e),
                Err(_) => {
                    handle.abort();
                    tracing::debug!("Persistence worker did not stop in time, aborted");
                },
            }
        }

        match tokio::time::timeout_at(deadline, self.flush_once()).await {
            Ok(Ok(true)) => tracing::info!("💾 Pending credential state flushed"),
            Ok(Ok(false)) => tracing::debug!("Nothing to flush on shutdown"),
            Ok(Err(e)) => tracing::warn!("⚠️ Final credential flush failed: {}", e),
            Err(_) => tracing::debug!(
                "Final flush interrupted after {}s",
                self.drain_timeout.as_secs()
            ),
        }
        tracing::info!("🛑 Persistence worker stopped");
    }
}

/// Load stored records into a fresh pool.
pub async fn restore_pool(
    storage: &dyn StorageAdapter,
    config: gateway_types::models::PoolConfig,
) -> AppResult<CredentialPool> {
    let records = storage.load_all().await?;
    let cursor = match storage.load_cursor().await {
        Ok(cursor) => cursor,
        Err(e) => {
            tracing::warn!("Rotation pointer unreadable, starting from the first record: {}", e);
            None
        },
    };
    Ok(CredentialPool::with_records(config, records, cursor))
}
