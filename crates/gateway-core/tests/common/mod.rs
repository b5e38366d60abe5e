#![allow(dead_code, reason = "each test binary uses a different subset of helpers")]

use axum_test::TestServer;
use gateway_core::proxy::{build_proxy_router, AppState, CredentialPool, UpstreamClient};
use gateway_types::models::{CredentialRecord, GatewayConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::MockServer;

pub const GENERATE_PATH: &str = "/v1internal:generateContent";
pub const STREAM_PATH: &str = "/v1internal:streamGenerateContent";

/// Config pointing at `upstream` with a retry bound of 2 and no backoff.
pub fn config_for(upstream: &MockServer) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.upstream.base_url = format!("{}/v1internal", upstream.uri());
    config.retry.max_retries = 2;
    config.retry.interval_ms = 0;
    config
}

/// Records already bound to a project, so no loadCodeAssist call happens.
pub fn records(count: usize) -> Vec<CredentialRecord> {
    (0..count)
        .map(|i| {
            let mut record = CredentialRecord::new(
                format!("cred-{i}"),
                json!({"access_token": format!("token-{i}"), "email": format!("user{i}@example.com")}),
            );
            record.project_id = Some(format!("proj-{i}"));
            record
        })
        .collect()
}

pub struct Harness {
    pub server: TestServer,
    pub pool: Arc<CredentialPool>,
}

pub fn harness(config: &GatewayConfig, records: Vec<CredentialRecord>) -> Harness {
    let pool = Arc::new(CredentialPool::with_records(config.pool.clone(), records, None));
    let upstream = Arc::new(
        UpstreamClient::from_config(&config.upstream).unwrap_or_else(|e| panic!("{e}")),
    );
    let state = AppState::new(config, pool.clone(), upstream, None);
    let router = build_proxy_router(state, config);
    let server = TestServer::new(router).unwrap_or_else(|e| panic!("{e}"));
    Harness { server, pool }
}

/// Native answer wrapped in the v1internal `response` envelope.
pub fn wrapped_text(text: &str, finish: &str) -> Value {
    json!({
        "response": {
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": finish,
                "index": 0
            }],
            "usageMetadata": {"promptTokenCount": 5, "candidatesTokenCount": 3, "totalTokenCount": 8}
        }
    })
}

pub fn sse_body(chunks: &[Value]) -> String {
    chunks.iter().map(|c| format!("data: {}\r\n\r\n", c)).collect()
}

pub fn chat_request(content: &str) -> Value {
    json!({
        "model": "gemini-2.5-pro",
        "messages": [{"role": "user", "content": content}]
    })
}

pub async fn upstream_bodies(upstream: &MockServer) -> Vec<Value> {
    upstream
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.body_json::<Value>().unwrap_or_else(|e| panic!("{e}")))
        .collect()
}
