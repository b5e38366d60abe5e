//! Explicit management operations: enable/disable, delete, upsert, project verification.

use gateway_types::models::{CredentialRecord, CredentialSummary};
use gateway_types::ProxyError;
use serde::Serialize;

use super::{now_millis, CallOutcome, CredentialPool};
use crate::proxy::project_resolver::ProjectResolver;

/// Raw counters exposed to operators.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct PoolStats {
    pub total: usize,
    pub enabled: usize,
    pub disabled: usize,
    /// Enabled records cooling down for at least one model
    pub cooling_down: usize,
    pub total_calls: u64,
    pub total_errors: u64,
}

impl CredentialPool {
    pub fn set_disabled(&self, id: &str, disabled: bool) -> Result<(), ProxyError> {
        let mut state = self.state.lock();
        let idx = state
            .position(id)
            .ok_or_else(|| ProxyError::CredentialNotFound { id: id.to_string() })?;
        let record = &mut state.records[idx];
        if record.disabled == disabled {
            return Ok(());
        }
        record.disabled = disabled;
        if !disabled {
            record.error_codes.clear();
        }
        tracing::info!(
            "{} Credential {}",
            if disabled { "⛔ Disabled" } else { "✅ Enabled" },
            id
        );
        state.touch();
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<CredentialRecord, ProxyError> {
        let mut state = self.state.lock();
        let idx = state
            .position(id)
            .ok_or_else(|| ProxyError::CredentialNotFound { id: id.to_string() })?;
        let removed = state.records.remove(idx);
        if idx < state.cursor {
            state.cursor -= 1;
        }
        let len = state.records.len();
        if len == 0 || state.cursor >= len {
            state.cursor = 0;
        }
        state.touch();
        tracing::info!("🗑️ Deleted credential {}", id);
        Ok(removed)
    }

    /// Insert or replace a record.
    ///
    /// A record sharing its `user_email` with an existing record under another
    /// id replaces that record. Returns the id that was replaced, if any.
    pub fn upsert(&self, record: CredentialRecord) -> Option<String> {
        let mut state = self.state.lock();

        if let Some(idx) = state.position(&record.id) {
            let id = record.id.clone();
            state.records[idx] = record;
            state.touch();
            tracing::info!("🔄 Replaced credential {}", id);
            return Some(id);
        }

        let duplicate = record.user_email.as_deref().and_then(|email| {
            state.records.iter().position(|r| {
                r.user_email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
        });
        if let Some(idx) = duplicate {
            let old_id = std::mem::replace(&mut state.records[idx], record).id;
            state.touch();
            tracing::info!("🔄 Credential {} superseded by same-identity upload", old_id);
            return Some(old_id);
        }

        tracing::info!("➕ Added credential {}", record.id);
        state.records.push(record);
        state.touch();
        None
    }

    pub fn list(&self) -> Vec<CredentialSummary> {
        let now_ms = now_millis();
        let state = self.state.lock();
        state.records.iter().map(|r| r.summary(now_ms)).collect()
    }

    pub fn stats(&self) -> PoolStats {
        let now_ms = now_millis();
        let state = self.state.lock();
        let mut stats = PoolStats { total: state.records.len(), ..PoolStats::default() };
        for record in &state.records {
            if record.disabled {
                stats.disabled += 1;
            } else {
                stats.enabled += 1;
                if record.model_cooldowns.values().any(|until| *until > now_ms) {
                    stats.cooling_down += 1;
                }
            }
            stats.total_calls += record.total_calls;
            stats.total_errors += record.total_errors;
        }
        stats
    }

    /// Resolve and store the record's cloud-project binding ahead of use.
    ///
    /// Authorization failures are fed through the client-error path so the
    /// auto-ban policy sees them.
    pub async fn verify_project_association(
        &self,
        id: &str,
        resolver: &dyn ProjectResolver,
    ) -> Result<String, ProxyError> {
        let access_token = {
            let state = self.state.lock();
            let record = state
                .records
                .iter()
                .find(|r| r.id == id)
                .ok_or_else(|| ProxyError::CredentialNotFound { id: id.to_string() })?;
            record.access_token().map(|s| s.to_string()).ok_or_else(|| {
                ProxyError::InvalidRequest { message: format!("credential {} has no access token", id) }
            })?
        };

        match resolver.resolve_project(&access_token).await {
            Ok(project_id) => {
                let mut state = self.state.lock();
                // Deleted while resolving: nothing to bind.
                let idx = state
                    .position(id)
                    .ok_or_else(|| ProxyError::CredentialNotFound { id: id.to_string() })?;
                let record = &mut state.records[idx];
                if record.project_id.as_deref() != Some(project_id.as_str()) {
                    tracing::info!("🔗 Credential {} bound to project {}", id, project_id);
                    record.project_id = Some(project_id.clone());
                    state.touch();
                }
                Ok(project_id)
            },
            Err(err) => {
                if let ProxyError::Upstream { status, .. } = &err {
                    if (400..500).contains(status) && *status != 429 {
                        self.apply_outcome(id, "", CallOutcome::ClientError(*status));
                    }
                }
                tracing::warn!("⚠️ Project verification failed for {}: {}", id, err);
                Err(err)
            },
        }
    }
}
