use futures::StreamExt;
use gateway_types::ProxyError;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{engine, user_request, ScriptedCaller};
use crate::proxy::mappers::openai::StreamTranslator;
use gateway_types::protocol::FinishReason;

fn chunk(text: &str) -> Result<Value, ProxyError> {
    Ok(json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}, "index": 0}]}))
}

fn terminal(text: &str, finish: &str) -> Result<Value, ProxyError> {
    Ok(json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}, "finishReason": finish, "index": 0}],
        "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 4, "totalTokenCount": 7}
    }))
}

async fn collect(caller: Arc<ScriptedCaller>, max_attempts: u32, done_mode: bool) -> Vec<Result<Value, ProxyError>> {
    engine(max_attempts, true)
        .stream(caller, "m".to_string(), user_request(), done_mode)
        .collect()
        .await
}

fn joined_text(items: &[Result<Value, ProxyError>]) -> String {
    items.iter().flatten().map(super::text_of).collect()
}

fn finish_reasons(items: &[Result<Value, ProxyError>]) -> Vec<String> {
    items
        .iter()
        .flatten()
        .filter_map(|c| c["candidates"][0]["finishReason"].as_str().map(|s| s.to_string()))
        .collect()
}

#[tokio::test]
async fn test_complete_stream_passes_through() {
    let caller = Arc::new(ScriptedCaller::with_streams(vec![Ok(vec![chunk("Hello "), terminal("world.", "STOP")])]));
    let items = collect(caller.clone(), 3, false).await;
    assert_eq!(joined_text(&items), "Hello world.");
    assert_eq!(finish_reasons(&items), vec!["STOP"]);
    assert_eq!(caller.calls(), 1);
}

#[tokio::test]
async fn test_truncated_stream_is_continued_seamlessly() {
    let caller = Arc::new(ScriptedCaller::with_streams(vec![
        Ok(vec![chunk("The answer is that "), terminal("the sky", "MAX_TOKENS")]),
        Ok(vec![chunk("that the sky "), terminal("is blue.", "STOP")]),
    ]));
    let items = collect(caller.clone(), 3, false).await;
    assert_eq!(joined_text(&items), "The answer is that the sky is blue.");
    // Exactly one terminal chunk reaches the client.
    assert_eq!(finish_reasons(&items), vec!["STOP"]);
    assert_eq!(caller.calls(), 2);

    // One translator, one outward id, one terminal frame.
    let mut translator = StreamTranslator::new("m");
    let frames: Vec<_> = items.iter().flatten().filter_map(|c| translator.translate(c)).collect();
    let ids: Vec<&str> = frames.iter().map(|f| f.id.as_str()).collect();
    assert!(ids.windows(2).all(|w| w[0] == w[1]));
    let terminal_frames: Vec<_> = frames.iter().filter(|f| f.choices[0].finish_reason.is_some()).collect();
    assert_eq!(terminal_frames.len(), 1);
    assert_eq!(terminal_frames[0].choices[0].finish_reason, Some(FinishReason::Stop));
}

#[tokio::test]
async fn test_stream_bound_reports_original_reason() {
    let caller = Arc::new(ScriptedCaller::with_streams(vec![
        Ok(vec![terminal("a1 ", "MAX_TOKENS")]),
        Ok(vec![terminal("b2 ", "MAX_TOKENS")]),
    ]));
    let items = collect(caller.clone(), 1, false).await;
    assert_eq!(joined_text(&items), "a1 b2 ");
    assert_eq!(finish_reasons(&items), vec!["MAX_TOKENS"]);
    assert_eq!(caller.calls(), 2);
}

#[tokio::test]
async fn test_done_marker_stripped_in_stream() {
    let caller = Arc::new(ScriptedCaller::with_streams(vec![Ok(vec![
        chunk("Finished answer.\n[do"),
        terminal("ne]", "STOP"),
    ])]));
    let items = collect(caller.clone(), 3, true).await;
    assert_eq!(joined_text(&items), "Finished answer.\n");
    assert_eq!(caller.calls(), 1);
}

#[tokio::test]
async fn test_first_stream_error_is_surfaced() {
    let caller = Arc::new(ScriptedCaller::with_streams(vec![Err(ProxyError::RateLimited {
        retry_after_secs: None,
        message: "slow down".to_string(),
    })]));
    let items = collect(caller, 3, false).await;
    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(ProxyError::RateLimited { .. })));
}

#[tokio::test]
async fn test_failed_continuation_closes_with_original_reason() {
    let caller = Arc::new(ScriptedCaller::with_streams(vec![
        Ok(vec![terminal("partial", "MAX_TOKENS")]),
        Err(ProxyError::Upstream { status: 500, message: "x".to_string() }),
    ]));
    let items = collect(caller, 3, false).await;
    assert_eq!(joined_text(&items), "partial");
    assert_eq!(finish_reasons(&items), vec!["MAX_TOKENS"]);
}

#[tokio::test]
async fn test_mid_stream_failure_ends_with_error() {
    let caller = Arc::new(ScriptedCaller::with_streams(vec![Ok(vec![
        chunk("Half of the "),
        Err(ProxyError::Upstream { status: 502, message: "connection reset".to_string() }),
    ])]));
    let items = collect(caller.clone(), 3, false).await;
    assert_eq!(joined_text(&items), "Half of the ");
    assert!(finish_reasons(&items).is_empty());
    assert!(matches!(items.last(), Some(Err(ProxyError::Upstream { status: 502, .. }))));
    assert_eq!(caller.calls(), 1);
}

#[tokio::test]
async fn test_continuation_failure_mid_stream_ends_with_error() {
    let caller = Arc::new(ScriptedCaller::with_streams(vec![
        Ok(vec![terminal("The list: one, ", "MAX_TOKENS")]),
        Ok(vec![chunk("two, "), Err(ProxyError::Upstream { status: 500, message: "x".to_string() })]),
    ]));
    let items = collect(caller.clone(), 3, false).await;
    assert_eq!(joined_text(&items), "The list: one, two, ");
    assert!(finish_reasons(&items).is_empty());
    assert!(matches!(items.last(), Some(Err(_))));
    assert_eq!(caller.calls(), 2);
}
