//! Credential record model.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of recent error codes kept per credential.
pub const MAX_ERROR_HISTORY: usize = 10;

/// One provider identity in the rotation pool.
///
/// The `credential` payload is owned by the auth collaborator (OAuth token
/// blob); the gateway only reads the access token and project id out of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialRecord {
    /// Unique identifier (usually the uploaded file name)
    pub id: String,
    /// Opaque credential payload
    pub credential: serde_json::Value,
    /// Never selected while set
    #[serde(default)]
    pub disabled: bool,
    /// Recent upstream error codes, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_codes: Vec<u16>,
    /// Epoch seconds of the last successful call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success: Option<i64>,
    /// Model name -> epoch millis until which the model must not be used
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub model_cooldowns: HashMap<String, i64>,
    /// Successful calls since this record last triggered a rotation
    #[serde(default)]
    pub calls_since_rotation: u32,
    /// Resolved user identity (email)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    /// Verified cloud project binding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub total_calls: u64,
    #[serde(default)]
    pub total_errors: u64,
    /// Epoch seconds
    #[serde(default)]
    pub created_at: i64,
}

/// Full-state snapshot handed to storage backends.
pub type CredentialSnapshot = CredentialRecord;

impl CredentialRecord {
    /// Create a new enabled record with the given payload.
    pub fn new(id: String, credential: serde_json::Value) -> Self {
        let user_email =
            credential.get("email").and_then(|v| v.as_str()).map(|s| s.to_string());
        Self {
            id,
            credential,
            disabled: false,
            error_codes: Vec::new(),
            last_success: None,
            model_cooldowns: HashMap::new(),
            calls_since_rotation: 0,
            user_email,
            project_id: None,
            total_calls: 0,
            total_errors: 0,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Bearer value attached to upstream calls.
    pub fn access_token(&self) -> Option<&str> {
        self.credential
            .get("access_token")
            .or_else(|| self.credential.get("token"))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Verified project binding, falling back to the one in the payload.
    pub fn effective_project_id(&self) -> Option<&str> {
        self.project_id
            .as_deref()
            .or_else(|| self.credential.get("project_id").and_then(|v| v.as_str()))
    }

    /// Whether `model` is cooling down at `now_ms`.
    pub fn is_cooling_down(&self, model: &str, now_ms: i64) -> bool {
        self.model_cooldowns.get(model).is_some_and(|until| *until > now_ms)
    }

    /// Append an error code, keeping only the most recent entries.
    pub fn push_error_code(&mut self, code: u16) {
        self.error_codes.push(code);
        if self.error_codes.len() > MAX_ERROR_HISTORY {
            let excess = self.error_codes.len() - MAX_ERROR_HISTORY;
            self.error_codes.drain(..excess);
        }
    }

    /// Occurrences of `code` in the recent history.
    pub fn error_count(&self, code: u16) -> usize {
        self.error_codes.iter().filter(|c| **c == code).count()
    }

    pub fn summary(&self, now_ms: i64) -> CredentialSummary {
        let mut cooling_models: Vec<String> = self
            .model_cooldowns
            .iter()
            .filter(|(_, until)| **until > now_ms)
            .map(|(model, _)| model.clone())
            .collect();
        cooling_models.sort();
        CredentialSummary {
            id: self.id.clone(),
            user_email: self.user_email.clone(),
            project_id: self.effective_project_id().map(|s| s.to_string()),
            disabled: self.disabled,
            error_codes: self.error_codes.clone(),
            last_success: self.last_success,
            cooling_models,
            total_calls: self.total_calls,
            total_errors: self.total_errors,
        }
    }
}

/// Payload-free view used by listings and the admin API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialSummary {
    pub id: String,
    pub user_email: Option<String>,
    pub project_id: Option<String>,
    pub disabled: bool,
    pub error_codes: Vec<u16>,
    pub last_success: Option<i64>,
    pub cooling_models: Vec<String>,
    pub total_calls: u64,
    pub total_errors: u64,
}
