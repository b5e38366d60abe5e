//! Native stream chunks → OpenAI `chat.completion.chunk` frames.
//!
//! One translator lives for one outward stream, so every frame carries the
//! same id even when the native chunks come from several upstream calls.

use gateway_types::protocol::{map_finish_reason, FinishReason, OpenAIUsage};
use serde_json::Value;

use super::models::{ChatCompletionChunk, ChunkChoice, Delta};
use super::response::{new_completion_id, to_response_tool_call};
use crate::proxy::mappers::accumulator::StreamChunkAccumulator;

pub struct StreamTranslator {
    id: String,
    created: i64,
    model: String,
    accumulator: StreamChunkAccumulator,
    /// Next tool-call index, in emission order across the whole stream
    next_tool_index: u32,
    role_sent: bool,
    finished: bool,
}

impl StreamTranslator {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            id: new_completion_id(),
            created: chrono::Utc::now().timestamp(),
            model: model.into(),
            accumulator: StreamChunkAccumulator::new(),
            next_tool_index: 0,
            role_sent: false,
            finished: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Translate one native chunk. Returns `None` when it carries nothing
    /// the client can see.
    pub fn translate(&mut self, chunk: &Value) -> Option<ChatCompletionChunk> {
        if self.finished {
            tracing::debug!("Dropping native chunk after terminal frame");
            return None;
        }
        let native = self.accumulator.ingest(chunk);

        let mut delta = Delta::default();
        if !native.text.is_empty() {
            delta.content = Some(native.text.clone());
        }
        if !native.reasoning.is_empty() {
            delta.reasoning_content = Some(native.reasoning.clone());
        }
        if !native.tool_calls.is_empty() {
            let calls = native
                .tool_calls
                .iter()
                .map(|call| {
                    let index = self.next_tool_index;
                    self.next_tool_index += 1;
                    to_response_tool_call(call, Some(index))
                })
                .collect();
            delta.tool_calls = Some(calls);
        }

        let finish_reason = native.finish_reason.as_deref().map(|raw| self.terminal_reason(raw));
        if finish_reason.is_none() && delta.is_empty() {
            return None;
        }
        Some(self.frame(delta, finish_reason))
    }

    /// Terminal frame for a stream that ended without a native finish reason.
    pub fn finish(&mut self) -> Option<ChatCompletionChunk> {
        if self.finished {
            return None;
        }
        let reason = self.terminal_reason("STOP");
        Some(self.frame(Delta::default(), Some(reason)))
    }

    fn terminal_reason(&self, raw: &str) -> FinishReason {
        if self.accumulator.has_tool_calls() {
            FinishReason::ToolCalls
        } else {
            map_finish_reason(raw)
        }
    }

    fn frame(&mut self, mut delta: Delta, finish_reason: Option<FinishReason>) -> ChatCompletionChunk {
        if !self.role_sent {
            delta.role = Some("assistant".to_string());
            self.role_sent = true;
        }
        let usage = if finish_reason.is_some() {
            self.finished = true;
            Some(self.accumulator.usage().map(OpenAIUsage::from).unwrap_or_default())
        } else {
            None
        };
        ChatCompletionChunk {
            id: self.id.clone(),
            object: "chat.completion.chunk".to_string(),
            created: self.created,
            model: self.model.clone(),
            choices: vec![ChunkChoice { index: 0, delta, finish_reason }],
            usage,
        }
    }
}
