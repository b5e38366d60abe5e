use futures::StreamExt;
use gateway_types::models::{AntiTruncationConfig, CredentialRecord, PoolConfig, RetryConfig};
use gateway_types::protocol::FinishReason;
use gateway_types::ProxyError;
use serde_json::{json, Value};
use std::sync::Arc;

use super::*;

/// Points at a closed port: any test that reaches the network fails loudly.
fn dispatcher(records: Vec<CredentialRecord>) -> RequestDispatcher {
    let pool = Arc::new(CredentialPool::with_records(PoolConfig::default(), records, None));
    let upstream = Arc::new(UpstreamClient::new(
        reqwest::Client::new(),
        "http://127.0.0.1:9/v1internal",
        "gateway-test",
    ));
    RequestDispatcher::new(
        pool,
        upstream,
        RetryConfig { enabled: true, max_retries: 2, interval_ms: 0 },
        AntiTruncationEngine::new(AntiTruncationConfig::default()),
    )
}

fn chat_body(tools: Value) -> Value {
    json!({
        "model": "gemini-2.5-pro",
        "messages": [{"role": "user", "content": "weather?"}],
        "tools": tools
    })
}

#[tokio::test]
async fn test_invalid_tool_name_fails_before_acquire() {
    let dispatcher = dispatcher(Vec::new());
    let body = chat_body(json!([{
        "type": "function",
        "function": {"name": "123bad", "parameters": {"type": "object"}}
    }]));

    let (format, result) = dispatcher.dispatch(body).await;
    assert_eq!(format, InboundFormat::OpenAI);
    assert_eq!(result.unwrap_err(), ProxyError::InvalidToolName { name: "123bad".to_string() });
}

#[tokio::test]
async fn test_missing_tool_name_fails_before_acquire() {
    let dispatcher = dispatcher(Vec::new());
    let body = json!({
        "model": "gemini-2.5-pro",
        "messages": [
            {"role": "user", "content": "weather?"},
            {"role": "tool", "tool_call_id": "call_1", "content": "sunny"}
        ]
    });

    let (_, result) = dispatcher.dispatch(body).await;
    assert_eq!(
        result.unwrap_err(),
        ProxyError::MissingToolName { tool_call_id: Some("call_1".to_string()) }
    );
}

#[tokio::test]
async fn test_empty_pool_is_exhausted() {
    let dispatcher = dispatcher(Vec::new());
    let (_, result) = dispatcher.dispatch(chat_body(json!([]))).await;
    let err = result.unwrap_err();
    assert_eq!(err.http_status_code(), 503);
    assert!(matches!(err, ProxyError::PoolExhausted { ref model } if model == "gemini-2.5-pro"));
}

#[tokio::test]
async fn test_native_body_on_chat_route_needs_model() {
    let dispatcher = dispatcher(Vec::new());
    let body = json!({"contents": [{"role": "user", "parts": [{"text": "hi"}]}]});
    let (format, result) = dispatcher.dispatch(body).await;
    assert_eq!(format, InboundFormat::Native);
    assert!(matches!(result, Err(ProxyError::InvalidRequest { .. })));
}

#[tokio::test]
async fn test_native_route_rejects_openai_body() {
    let dispatcher = dispatcher(Vec::new());
    let result = dispatcher.dispatch_native("gemini-2.5-pro", chat_body(json!([])), false).await;
    assert!(matches!(result, Err(ProxyError::InvalidRequest { .. })));
}

#[tokio::test]
async fn test_unreachable_upstream_reports_server_error() {
    let record = CredentialRecord::new(
        "c1".to_string(),
        json!({"access_token": "t-1", "project_id": "proj-1"}),
    );
    let dispatcher = dispatcher(vec![record]);
    let (_, result) = dispatcher.dispatch(chat_body(json!([]))).await;

    assert_eq!(result.unwrap_err().http_status_code(), 502);
    let record = dispatcher.pool().get("c1").unwrap_or_else(|| panic!("record gone"));
    assert_eq!(record.error_codes, vec![502]);
    assert!(!record.disabled);
}

#[tokio::test]
async fn test_translate_stream_single_id_and_terminal() {
    let chunks: Vec<Result<Value, ProxyError>> = vec![
        Ok(json!({"candidates": [{"content": {"role": "model", "parts": [{"text": "Hel"}]}}]})),
        Ok(json!({"candidates": [{"content": {"role": "model", "parts": [{"text": "lo"}]}, "finishReason": "STOP"}],
                  "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 2, "totalTokenCount": 5}})),
    ];
    let upstream: GeminiEventStream = Box::pin(futures::stream::iter(chunks));
    let frames: Vec<_> = translate_stream(upstream, "gemini-2.5-pro".to_string()).collect().await;

    assert_eq!(frames.len(), 2);
    let frames: Vec<ChatCompletionChunk> =
        frames.into_iter().map(|f| f.unwrap_or_else(|e| panic!("{e}"))).collect();
    assert_eq!(frames[0].id, frames[1].id);
    assert_eq!(frames[1].choices[0].finish_reason, Some(FinishReason::Stop));
    assert_eq!(frames[1].usage.as_ref().map(|u| u.total_tokens), Some(5));
}

#[tokio::test]
async fn test_translate_stream_without_terminal_still_finishes() {
    let chunks: Vec<Result<Value, ProxyError>> =
        vec![Ok(json!({"candidates": [{"content": {"role": "model", "parts": [{"text": "partial"}]}}]}))];
    let upstream: GeminiEventStream = Box::pin(futures::stream::iter(chunks));
    let frames: Vec<_> = translate_stream(upstream, "m".to_string()).collect().await;

    assert_eq!(frames.len(), 2);
    let last = frames[1].as_ref().unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(last.choices[0].finish_reason, Some(FinishReason::Stop));
}

#[tokio::test]
async fn test_translate_stream_forwards_error_and_stops() {
    let chunks: Vec<Result<Value, ProxyError>> = vec![
        Ok(json!({"candidates": [{"content": {"role": "model", "parts": [{"text": "a"}]}}]})),
        Err(ProxyError::Upstream { status: 502, message: "broken".to_string() }),
        Ok(json!({"candidates": [{"content": {"role": "model", "parts": [{"text": "b"}]}}]})),
    ];
    let upstream: GeminiEventStream = Box::pin(futures::stream::iter(chunks));
    let frames: Vec<_> = translate_stream(upstream, "m".to_string()).collect().await;

    assert_eq!(frames.len(), 2);
    assert!(frames[1].is_err());
}

#[tokio::test]
async fn test_peek_first_surfaces_leading_error() {
    let chunks: Vec<Result<Value, ProxyError>> =
        vec![Err(ProxyError::PoolExhausted { model: "m".to_string() })];
    let upstream: GeminiEventStream = Box::pin(futures::stream::iter(chunks));
    let err = peek_first(upstream).await.err();
    assert_eq!(err, Some(ProxyError::PoolExhausted { model: "m".to_string() }));
}

#[tokio::test]
async fn test_peek_first_keeps_first_item() {
    let chunks: Vec<Result<Value, ProxyError>> = vec![Ok(json!({"n": 1})), Ok(json!({"n": 2}))];
    let upstream: GeminiEventStream = Box::pin(futures::stream::iter(chunks));
    let peeked = peek_first(upstream).await.unwrap_or_else(|e| panic!("{e}"));
    let items: Vec<Value> = peeked.map(|i| i.unwrap_or_else(|e| panic!("{e}"))).collect().await;
    assert_eq!(items, vec![json!({"n": 1}), json!({"n": 2})]);
}
