//! Request-path errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while serving a gateway request.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ProxyError {
    /// Every credential is disabled or cooling down for the model
    #[error("No usable credential for model {model}")]
    PoolExhausted { model: String },

    /// A declared function name does not match the provider's naming rules
    #[error("Invalid tool name: '{name}'")]
    InvalidToolName { name: String },

    /// A tool-role message did not carry the function name
    #[error("Tool result{} is missing the function name", tool_call_id.as_ref().map(|id| format!(" for call {}", id)).unwrap_or_default())]
    MissingToolName { tool_call_id: Option<String> },

    /// An assistant turn lost all of its tool calls and has no text left
    #[error("Assistant message {index} has no resolvable tool call or text")]
    UnresolvableToolTurn { index: usize },

    /// Request body could not be understood
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Upstream answered 429 and the retry budget is spent
    #[error("Rate limited by upstream{}: {message}", retry_after_secs.map(|s| format!(", retry after {}s", s)).unwrap_or_default())]
    RateLimited {
        retry_after_secs: Option<u64>,
        message: String,
    },

    /// Upstream answered with a non-429 error status
    #[error("Upstream error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },

    /// Credential id is unknown to the pool
    #[error("Credential not found: {id}")]
    CredentialNotFound { id: String },

    /// Internal gateway error (bugs, unexpected states)
    #[error("Internal gateway error: {message}")]
    Internal { message: String },
}

impl ProxyError {
    /// Only upstream rate limiting is retried inside the dispatcher.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Check if this is a client error (4xx equivalent) caused by the request itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidToolName { .. }
                | Self::MissingToolName { .. }
                | Self::UnresolvableToolTurn { .. }
                | Self::InvalidRequest { .. }
        )
    }

    /// Get HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::PoolExhausted { .. } => 503,
            Self::InvalidToolName { .. }
            | Self::MissingToolName { .. }
            | Self::UnresolvableToolTurn { .. }
            | Self::InvalidRequest { .. } => 400,
            Self::RateLimited { .. } => 429,
            Self::Upstream { status, .. } => *status,
            Self::CredentialNotFound { .. } => 404,
            Self::Internal { .. } => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_codes() {
        assert_eq!(ProxyError::PoolExhausted { model: "m".to_string() }.http_status_code(), 503);
        assert_eq!(
            ProxyError::InvalidToolName { name: "123bad".to_string() }.http_status_code(),
            400
        );
        assert_eq!(ProxyError::MissingToolName { tool_call_id: None }.http_status_code(), 400);
        assert_eq!(ProxyError::UnresolvableToolTurn { index: 2 }.http_status_code(), 400);
        assert_eq!(
            ProxyError::RateLimited { retry_after_secs: None, message: String::new() }
                .http_status_code(),
            429
        );
        assert_eq!(
            ProxyError::Upstream { status: 502, message: "bad gateway".to_string() }
                .http_status_code(),
            502
        );
    }

    #[test]
    fn test_tool_errors_are_not_retryable() {
        let errors = [
            ProxyError::InvalidToolName { name: "x y".to_string() },
            ProxyError::MissingToolName { tool_call_id: Some("call_1".to_string()) },
            ProxyError::UnresolvableToolTurn { index: 0 },
        ];
        for err in errors {
            assert!(err.is_client_error());
            assert!(!err.is_retryable());
        }
        assert!(ProxyError::RateLimited { retry_after_secs: Some(3), message: String::new() }
            .is_retryable());
    }

    #[test]
    fn test_display_includes_call_id() {
        let err = ProxyError::MissingToolName { tool_call_id: Some("call_abc".to_string()) };
        assert!(err.to_string().contains("call_abc"));
    }
}
