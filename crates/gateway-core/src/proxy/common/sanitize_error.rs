//! Upstream error sanitization: project ids, account emails and raw provider
//! bodies stay in the server log; clients only see a category and the status.

/// Category of an upstream failure, detected from status and well-known markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    RateLimited,
    QuotaExhausted,
    Unauthorized,
    ServiceDisabled,
    ModelNotFound,
    PromptTooLong,
    InvalidArgument,
    ServerError,
    Unknown,
}

impl UpstreamErrorKind {
    pub fn classify(status_code: u16, raw_text: &str) -> Self {
        match status_code {
            429 if raw_text.contains("QUOTA_EXHAUSTED") => Self::QuotaExhausted,
            429 => Self::RateLimited,
            401 => Self::Unauthorized,
            403 if raw_text.contains("SERVICE_DISABLED")
                || raw_text.contains("CONSUMER_INVALID")
                || raw_text.contains("has not been used in project") =>
            {
                Self::ServiceDisabled
            },
            403 => Self::Unauthorized,
            404 => Self::ModelNotFound,
            400 if raw_text.contains("exceeds the maximum number of tokens")
                || raw_text.contains("prompt is too long") =>
            {
                Self::PromptTooLong
            },
            400 if raw_text.contains("INVALID_ARGUMENT") => Self::InvalidArgument,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::RateLimited => "Rate limited",
            Self::QuotaExhausted => "Quota exhausted",
            Self::Unauthorized => "Authentication failed",
            Self::ServiceDisabled => "Service not enabled for credential",
            Self::ModelNotFound => "Model not available",
            Self::PromptTooLong => "Prompt too long",
            Self::InvalidArgument => "Request rejected by upstream",
            Self::ServerError => "Upstream server error",
            Self::Unknown => "Upstream error",
        }
    }
}

/// Opaque client-facing message for an upstream failure.
pub fn sanitize_upstream_error(status_code: u16, raw_text: &str) -> String {
    let kind = UpstreamErrorKind::classify(status_code, raw_text);
    format!("{} (HTTP {})", kind.label(), status_code)
}
