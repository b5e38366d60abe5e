use gateway_types::models::CredentialRecord;
use gateway_types::ProxyError;

use super::{now_millis, CredentialPool};

/// What a request holds while it uses a credential.
///
/// Concurrent requests may hold leases on the same record; the lease is only
/// the handle the outcome is reported against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialLease {
    pub credential_id: String,
    /// Model the cooldown bookkeeping is keyed on
    pub model: String,
    pub access_token: String,
    pub project_id: Option<String>,
    pub user_email: Option<String>,
}

fn is_selectable(record: &CredentialRecord, model: &str, now_ms: i64) -> bool {
    !record.disabled && !record.is_cooling_down(model, now_ms) && record.access_token().is_some()
}

impl CredentialPool {
    /// Pick a usable credential for `model`, starting at the rotation pointer.
    ///
    /// Disabled records and records cooling down for this model are skipped.
    /// The pointer itself only moves on reported outcomes.
    pub fn acquire(&self, model: &str) -> Result<CredentialLease, ProxyError> {
        let now_ms = now_millis();
        let mut state = self.state.lock();
        let len = state.records.len();
        if len == 0 {
            tracing::warn!("⚠️ Credential pool is empty");
            return Err(ProxyError::PoolExhausted { model: model.to_string() });
        }

        let start = state.cursor % len;
        let chosen = (0..len)
            .map(|offset| (start + offset) % len)
            .find(|idx| is_selectable(&state.records[*idx], model, now_ms));

        let Some(idx) = chosen else {
            tracing::warn!("⚠️ No usable credential for model {} ({} records)", model, len);
            return Err(ProxyError::PoolExhausted { model: model.to_string() });
        };

        // Expired cooldowns are dropped lazily, only when they are observed.
        let record = &mut state.records[idx];
        let had_expired = record.model_cooldowns.remove(model).is_some();
        let lease = CredentialLease {
            credential_id: record.id.clone(),
            model: model.to_string(),
            access_token: record.access_token().unwrap_or_default().to_string(),
            project_id: record.effective_project_id().map(|s| s.to_string()),
            user_email: record.user_email.clone(),
        };
        if had_expired {
            state.touch();
        }

        tracing::debug!("Selected credential {} for model {}", lease.credential_id, model);
        Ok(lease)
    }

    /// Re-issue `lease` while ignoring its cooldown, as long as the record is
    /// still present and enabled. Used when a retry finds nothing else usable.
    pub fn renew(&self, lease: &CredentialLease) -> Option<CredentialLease> {
        let state = self.state.lock();
        let record = state.records.iter().find(|r| r.id == lease.credential_id)?;
        if record.disabled {
            return None;
        }
        let access_token = record.access_token()?.to_string();
        Some(CredentialLease {
            credential_id: record.id.clone(),
            model: lease.model.clone(),
            access_token,
            project_id: record.effective_project_id().map(|s| s.to_string()),
            user_email: record.user_email.clone(),
        })
    }
}
