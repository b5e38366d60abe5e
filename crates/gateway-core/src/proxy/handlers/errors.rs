//! Error envelopes in each caller's own format.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use gateway_types::ProxyError;
use serde_json::{json, Value};

use crate::proxy::dispatcher::InboundFormat;

fn status_of(err: &ProxyError) -> StatusCode {
    StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::BAD_GATEWAY)
}

/// Stable machine-readable code for the OpenAI envelope.
pub fn error_code(err: &ProxyError) -> &'static str {
    match err {
        ProxyError::PoolExhausted { .. } => "pool_exhausted",
        ProxyError::InvalidToolName { .. } => "invalid_tool_name",
        ProxyError::MissingToolName { .. } => "missing_tool_name",
        ProxyError::UnresolvableToolTurn { .. } => "unresolvable_tool_turn",
        ProxyError::InvalidRequest { .. } => "invalid_request",
        ProxyError::RateLimited { .. } => "rate_limit_exceeded",
        ProxyError::Upstream { .. } => "upstream_error",
        ProxyError::CredentialNotFound { .. } => "credential_not_found",
        ProxyError::Internal { .. } => "internal_error",
    }
}

fn openai_error_type(err: &ProxyError) -> &'static str {
    match err.http_status_code() {
        429 => "rate_limit_error",
        401 | 403 => "authentication_error",
        404 => "not_found_error",
        400..=499 => "invalid_request_error",
        _ => "server_error",
    }
}

/// `google.rpc.Code` name for an HTTP status.
pub fn native_status(code: u16) -> &'static str {
    match code {
        400 => "INVALID_ARGUMENT",
        401 => "UNAUTHENTICATED",
        403 => "PERMISSION_DENIED",
        404 => "NOT_FOUND",
        409 => "ABORTED",
        429 => "RESOURCE_EXHAUSTED",
        499 => "CANCELLED",
        501 => "UNIMPLEMENTED",
        503 => "UNAVAILABLE",
        504 => "DEADLINE_EXCEEDED",
        500..=599 => "INTERNAL",
        _ => "UNKNOWN",
    }
}

pub fn openai_error_body(err: &ProxyError) -> Value {
    json!({
        "error": {
            "message": err.to_string(),
            "type": openai_error_type(err),
            "code": error_code(err),
            "param": null
        }
    })
}

pub fn native_error_body(err: &ProxyError) -> Value {
    let code = err.http_status_code();
    json!({
        "error": {
            "code": code,
            "message": err.to_string(),
            "status": native_status(code)
        }
    })
}

pub fn error_response(format: InboundFormat, err: &ProxyError) -> Response {
    let body = match format {
        InboundFormat::OpenAI => openai_error_body(err),
        InboundFormat::Native => native_error_body(err),
    };
    if err.is_client_error() {
        tracing::info!("Rejected {} request: {}", format.as_str(), err);
    } else {
        tracing::warn!("⚠️ {} request failed: {}", format.as_str(), err);
    }

    let mut response = (status_of(err), Json(body)).into_response();
    if let ProxyError::RateLimited { retry_after_secs: Some(secs), .. } = err {
        if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
    }
    response
}

/// Error as one SSE frame, for failures after the stream already started.
pub fn sse_error_frame(format: InboundFormat, err: &ProxyError) -> Bytes {
    let body = match format {
        InboundFormat::OpenAI => openai_error_body(err),
        InboundFormat::Native => native_error_body(err),
    };
    Bytes::from(format!("data: {}\n\n", body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_envelope() {
        let err = ProxyError::InvalidToolName { name: "123bad".to_string() };
        let body = openai_error_body(&err);
        assert_eq!(body["error"]["type"], "invalid_request_error");
        assert_eq!(body["error"]["code"], "invalid_tool_name");
        assert!(body["error"]["message"].as_str().is_some_and(|m| m.contains("123bad")));
    }

    #[test]
    fn test_native_envelope() {
        let err = ProxyError::PoolExhausted { model: "gemini-2.5-pro".to_string() };
        let body = native_error_body(&err);
        assert_eq!(body["error"]["code"], 503);
        assert_eq!(body["error"]["status"], "UNAVAILABLE");

        let limited = ProxyError::RateLimited { retry_after_secs: None, message: String::new() };
        assert_eq!(native_error_body(&limited)["error"]["status"], "RESOURCE_EXHAUSTED");
    }

    #[test]
    fn test_rate_limit_sets_retry_after() {
        let err = ProxyError::RateLimited { retry_after_secs: Some(7), message: "slow down".to_string() };
        let response = error_response(InboundFormat::OpenAI, &err);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).and_then(|v| v.to_str().ok()),
            Some("7")
        );
    }

    #[test]
    fn test_upstream_status_is_kept() {
        let err = ProxyError::Upstream { status: 403, message: "denied".to_string() };
        assert_eq!(error_response(InboundFormat::Native, &err).status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_sse_frame_shape() {
        let err = ProxyError::Upstream { status: 502, message: "gone".to_string() };
        let frame = sse_error_frame(InboundFormat::OpenAI, &err);
        let text = String::from_utf8_lossy(&frame);
        assert!(text.starts_with("data: {"));
        assert!(text.ends_with("\n\n"));
        assert!(text.contains("upstream_error"));
    }
}
