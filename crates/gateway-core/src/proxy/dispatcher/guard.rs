use std::sync::Arc;

use crate::proxy::credential_pool::{CallOutcome, CredentialLease, CredentialPool};

/// Reports the outcome of a streamed call exactly once.
///
/// A stream dropped before it finished (client went away) still reports:
/// success when valid data already arrived, nothing otherwise.
pub struct OutcomeGuard {
    pool: Arc<CredentialPool>,
    lease: CredentialLease,
    received_data: bool,
    reported: bool,
}

impl OutcomeGuard {
    pub fn new(pool: Arc<CredentialPool>, lease: CredentialLease) -> Self {
        Self { pool, lease, received_data: false, reported: false }
    }

    pub fn mark_data(&mut self) {
        self.received_data = true;
    }

    pub fn received_data(&self) -> bool {
        self.received_data
    }

    /// Upstream ended the stream normally.
    pub fn complete(&mut self) {
        let outcome = if self.received_data {
            CallOutcome::Success
        } else {
            CallOutcome::ServerError(502)
        };
        self.report(outcome);
    }

    pub fn fail(&mut self, outcome: CallOutcome) {
        self.report(outcome);
    }

    fn report(&mut self, outcome: CallOutcome) {
        if self.reported {
            return;
        }
        self.reported = true;
        self.pool.report(&self.lease, outcome);
    }
}

impl Drop for OutcomeGuard {
    fn drop(&mut self) {
        if self.reported {
            return;
        }
        if self.received_data {
            tracing::debug!("Stream via {} abandoned after data, reporting success", self.lease.credential_id);
            self.report(CallOutcome::Success);
        } else {
            tracing::debug!("Stream via {} abandoned before any data", self.lease.credential_id);
        }
    }
}
