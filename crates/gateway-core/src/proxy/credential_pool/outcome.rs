use std::time::Duration;

use super::{now_millis, CredentialLease, CredentialPool, PoolState};

/// Result of one upstream call, as seen by the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    /// Upstream 429; `retry_after` comes from the response when it carries a hint
    RateLimited { retry_after: Option<Duration> },
    ClientError(u16),
    ServerError(u16),
}

impl CallOutcome {
    /// Classify an upstream HTTP status.
    pub fn from_status(status: u16, retry_after: Option<Duration>) -> Self {
        match status {
            200..=299 => CallOutcome::Success,
            429 => CallOutcome::RateLimited { retry_after },
            400..=499 => CallOutcome::ClientError(status),
            _ => CallOutcome::ServerError(status),
        }
    }
}

/// Observable effect of a report, mostly for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportEffect {
    Recorded,
    /// Success pushed the call counter over the threshold
    Rotated,
    CooledDown { until_ms: i64 },
    /// Record went from enabled to disabled by this report
    Banned,
    /// Record was deleted while the request was in flight
    UnknownCredential,
}

impl CredentialPool {
    /// Record the outcome of a call made with `lease`.
    pub fn report(&self, lease: &CredentialLease, outcome: CallOutcome) -> ReportEffect {
        self.apply_outcome(&lease.credential_id, &lease.model, outcome)
    }

    pub(crate) fn apply_outcome(&self, id: &str, model: &str, outcome: CallOutcome) -> ReportEffect {
        let mut state = self.state.lock();
        let Some(idx) = state.position(id) else {
            tracing::debug!("Outcome for unknown credential {} ignored", id);
            return ReportEffect::UnknownCredential;
        };

        let effect = match outcome {
            CallOutcome::Success => self.record_success(&mut state, idx, model),
            CallOutcome::RateLimited { retry_after } => {
                let cooldown =
                    retry_after.unwrap_or(Duration::from_secs(self.config.default_cooldown_secs));
                let until_ms = now_millis().saturating_add(cooldown.as_millis() as i64);
                let record = &mut state.records[idx];
                record.model_cooldowns.insert(model.to_string(), until_ms);
                record.push_error_code(429);
                record.total_errors += 1;
                tracing::warn!(
                    "⏳ Credential {} cooling down for {} ({}s)",
                    record.id,
                    model,
                    cooldown.as_secs()
                );
                ReportEffect::CooledDown { until_ms }
            },
            CallOutcome::ClientError(code) => self.record_client_error(&mut state, idx, code),
            CallOutcome::ServerError(code) => {
                let record = &mut state.records[idx];
                record.push_error_code(code);
                record.total_errors += 1;
                tracing::debug!("Credential {} saw upstream {}", record.id, code);
                ReportEffect::Recorded
            },
        };

        state.touch();
        drop(state);
        // Bans should reach storage before the next timer tick.
        if effect == ReportEffect::Banned {
            self.request_flush();
        }
        effect
    }

    fn record_success(&self, state: &mut PoolState, idx: usize, model: &str) -> ReportEffect {
        let threshold = self.config.calls_per_rotation.max(1);
        let record = &mut state.records[idx];
        record.total_calls += 1;
        record.last_success = Some(chrono::Utc::now().timestamp());
        record.error_codes.clear();
        record.model_cooldowns.remove(model);
        record.calls_since_rotation += 1;

        if record.calls_since_rotation < threshold {
            return ReportEffect::Recorded;
        }

        record.calls_since_rotation = 0;
        let len = state.records.len();
        state.cursor = (idx + 1) % len;
        tracing::debug!("🔄 Rotation pointer advanced to {}", state.cursor);
        ReportEffect::Rotated
    }

    fn record_client_error(&self, state: &mut PoolState, idx: usize, code: u16) -> ReportEffect {
        let ban = &self.config.auto_ban;
        let record = &mut state.records[idx];
        record.push_error_code(code);
        record.total_errors += 1;

        if !ban.is_ban_code(code) || record.disabled {
            return ReportEffect::Recorded;
        }
        if record.error_count(code) < ban.threshold as usize {
            return ReportEffect::Recorded;
        }

        record.disabled = true;
        tracing::warn!("🚫 Credential {} auto-banned after HTTP {}", record.id, code);
        ReportEffect::Banned
    }
}
