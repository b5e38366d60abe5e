use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Keys guarding the two route groups. `None` leaves proxy routes open and
/// turns the admin API off.
#[derive(Debug, Clone, Default)]
pub struct AccessKeys {
    pub api_key: Option<String>,
    pub admin_key: Option<String>,
}

impl AccessKeys {
    pub fn new(api_key: Option<String>, admin_key: Option<String>) -> Self {
        let non_empty = |k: Option<String>| k.filter(|s| !s.trim().is_empty());
        Self { api_key: non_empty(api_key), admin_key: non_empty(admin_key) }
    }
}

pub async fn auth_middleware(
    State(keys): State<Arc<AccessKeys>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if request.method() == Method::OPTIONS || is_health_check(request.uri().path()) {
        return Ok(next.run(request).await);
    }
    let Some(expected) = keys.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let presented = header_key(&request).or_else(|| query_key(&request));
    if presented.as_deref().is_some_and(|k| constant_time_compare(k, expected)) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("🔒 Rejected unauthenticated {} {}", request.method(), request.uri().path());
        Err(StatusCode::UNAUTHORIZED)
    }
}

/// Admin routes only accept the key in a header.
pub async fn admin_auth_middleware(
    State(keys): State<Arc<AccessKeys>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = keys.admin_key.as_deref() else {
        return Err(StatusCode::NOT_FOUND);
    };

    if header_key(&request).as_deref().is_some_and(|k| constant_time_compare(k, expected)) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("🔒 Rejected admin call {} {}", request.method(), request.uri().path());
        Err(StatusCode::UNAUTHORIZED)
    }
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn is_health_check(path: &str) -> bool {
    path == "/healthz"
}

fn header_key(request: &Request) -> Option<String> {
    let headers = request.headers();
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.strip_prefix("Bearer ").unwrap_or(s))
        .or_else(|| headers.get("x-goog-api-key").and_then(|h| h.to_str().ok()))
        .or_else(|| headers.get("x-api-key").and_then(|h| h.to_str().ok()))
        .map(|s| s.trim().to_string())
}

/// Native clients often pass `?key=`.
fn query_key(request: &Request) -> Option<String> {
    let query = request.uri().query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == "key")
        .map(|(_, value)| value.into_owned())
}
