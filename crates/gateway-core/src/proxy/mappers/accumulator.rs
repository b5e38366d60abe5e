//! Per-request state folded from native stream chunks.

use gateway_types::protocol::GeminiUsageMetadata;
use serde_json::Value;

use super::canonical::ToolCall;

/// What one native chunk contributed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkDelta {
    pub text: String,
    pub reasoning: String,
    pub tool_calls: Vec<ToolCall>,
    /// Raw native finish reason, present on the terminal chunk
    pub finish_reason: Option<String>,
    pub usage: Option<GeminiUsageMetadata>,
}

impl ChunkDelta {
    pub fn is_terminal(&self) -> bool {
        self.finish_reason.is_some()
    }
}

/// Running state of one upstream answer. Only candidate 0 is tracked.
///
/// Text is not kept here: each consumer keeps the text it actually emitted,
/// which differs from the raw upstream text once markers or overlaps are cut.
#[derive(Debug, Clone, Default)]
pub struct StreamChunkAccumulator {
    tool_calls: usize,
    finish_reason: Option<String>,
    usage: Option<GeminiUsageMetadata>,
}

impl StreamChunkAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, chunk: &Value) -> ChunkDelta {
        let delta = extract_delta(chunk);
        self.tool_calls += delta.tool_calls.len();
        if let Some(reason) = &delta.finish_reason {
            self.finish_reason = Some(reason.clone());
        }
        if let Some(usage) = &delta.usage {
            self.usage = Some(usage.clone());
        }
        delta
    }

    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls > 0
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.finish_reason.as_deref()
    }

    pub fn usage(&self) -> Option<&GeminiUsageMetadata> {
        self.usage.as_ref()
    }
}

/// Classify the parts of candidate 0 of a native response or chunk.
pub fn extract_delta(chunk: &Value) -> ChunkDelta {
    let mut delta = ChunkDelta {
        usage: chunk
            .get("usageMetadata")
            .and_then(|u| serde_json::from_value::<GeminiUsageMetadata>(u.clone()).ok()),
        ..ChunkDelta::default()
    };
    let Some(candidate) = chunk.get("candidates").and_then(|c| c.get(0)) else {
        return delta;
    };
    for part in candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .into_iter()
        .flatten()
    {
        if let Some(call) = ToolCall::from_native_part(part) {
            delta.tool_calls.push(call);
        } else if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
            if part.get("thought").and_then(|t| t.as_bool()).unwrap_or(false) {
                delta.reasoning.push_str(text);
            } else {
                delta.text.push_str(text);
            }
        }
    }
    delta.finish_reason = candidate
        .get("finishReason")
        .and_then(|f| f.as_str())
        .filter(|f| !f.is_empty() && *f != "FINISH_REASON_UNSPECIFIED")
        .map(|f| f.to_string());
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accumulates_across_chunks() {
        let mut acc = StreamChunkAccumulator::new();
        let first = acc.ingest(&json!({"candidates": [{"content": {"parts": [{"text": "think", "thought": true}]}}]}));
        assert_eq!(first.reasoning, "think");
        acc.ingest(&json!({"candidates": [{"content": {"parts": [{"text": "Hel"}]}}]}));
        assert!(!acc.has_tool_calls());
        assert_eq!(acc.finish_reason(), None);
        let last = acc.ingest(&json!({
            "candidates": [{"content": {"parts": [{"text": "lo"}, {"functionCall": {"name": "f", "args": {}}}]}, "finishReason": "STOP"}],
            "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 2, "totalTokenCount": 5}
        }));
        assert!(last.is_terminal());
        assert_eq!(last.text, "lo");
        assert!(acc.has_tool_calls());
        assert_eq!(acc.finish_reason(), Some("STOP"));
        assert_eq!(acc.usage().map(|u| u.total_token_count), Some(5));
    }

    #[test]
    fn test_unspecified_finish_is_not_terminal() {
        let delta = extract_delta(&json!({"candidates": [{"finishReason": "FINISH_REASON_UNSPECIFIED"}]}));
        assert!(!delta.is_terminal());
    }
}
