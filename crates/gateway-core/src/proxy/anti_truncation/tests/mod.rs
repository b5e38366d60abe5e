mod streaming_tests;

use async_trait::async_trait;
use gateway_types::models::AntiTruncationConfig;
use gateway_types::ProxyError;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;

use super::{AntiTruncationEngine, GeminiEventStream, UpstreamCaller};

type ScriptedStream = Result<Vec<Result<Value, ProxyError>>, ProxyError>;

/// Replays canned upstream answers and records every request it saw.
#[derive(Default)]
pub(super) struct ScriptedCaller {
    responses: Mutex<VecDeque<Result<Value, ProxyError>>>,
    streams: Mutex<VecDeque<ScriptedStream>>,
    pub requests: Mutex<Vec<Value>>,
}

impl ScriptedCaller {
    pub fn with_responses(responses: Vec<Result<Value, ProxyError>>) -> Self {
        Self { responses: Mutex::new(responses.into()), ..Self::default() }
    }

    pub fn with_streams(streams: Vec<ScriptedStream>) -> Self {
        Self { streams: Mutex::new(streams.into()), ..Self::default() }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl UpstreamCaller for ScriptedCaller {
    async fn generate(&self, _model: &str, request: &Value) -> Result<Value, ProxyError> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ProxyError::Internal { message: "script exhausted".to_string() }))
    }

    async fn stream_generate(&self, _model: &str, request: &Value) -> Result<GeminiEventStream, ProxyError> {
        self.requests.lock().push(request.clone());
        let script = self
            .streams
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ProxyError::Internal { message: "script exhausted".to_string() }))?;
        Ok(Box::pin(futures::stream::iter(script)))
    }
}

pub(super) fn engine(max_attempts: u32, always_on: bool) -> AntiTruncationEngine {
    AntiTruncationEngine::new(AntiTruncationConfig {
        max_attempts,
        min_overlap_chars: 4,
        max_overlap_chars: 50,
        always_on,
    })
}

pub(super) fn response(text: &str, finish: &str) -> Value {
    json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}, "finishReason": finish, "index": 0}],
        "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5, "totalTokenCount": 15}
    })
}

pub(super) fn text_of(value: &Value) -> String {
    crate::proxy::mappers::accumulator::extract_delta(value).text
}

pub(super) fn user_request() -> Value {
    json!({"contents": [{"role": "user", "parts": [{"text": "Write a story."}]}]})
}
