//! Native non-streaming response → ChatCompletion.

use gateway_types::protocol::{map_finish_reason, FinishReason, GeminiUsageMetadata, OpenAIUsage};
use serde_json::Value;

use super::models::{ChatCompletion, Choice, ResponseFunction, ResponseMessage, ResponseToolCall};
use crate::proxy::mappers::canonical::{CanonicalMessage, ToolCall};

pub fn new_completion_id() -> String {
    format!("chatcmpl-{}", uuid::Uuid::new_v4())
}

/// Non-streaming calls never carry `index`.
pub(crate) fn to_response_tool_call(call: &ToolCall, index: Option<u32>) -> ResponseToolCall {
    ResponseToolCall {
        index,
        id: call.wire_id(),
        call_type: "function".to_string(),
        function: ResponseFunction { name: call.name.clone(), arguments: call.arguments_string() },
    }
}

pub fn build_chat_completion(native: &Value, model: &str) -> ChatCompletion {
    let choices = native
        .get("candidates")
        .and_then(|c| c.as_array())
        .map(|candidates| {
            candidates
                .iter()
                .enumerate()
                .map(|(i, candidate)| build_choice(candidate, i as u32))
                .collect()
        })
        .unwrap_or_default();

    let usage = native
        .get("usageMetadata")
        .and_then(|u| serde_json::from_value::<GeminiUsageMetadata>(u.clone()).ok())
        .map(|u| OpenAIUsage::from(&u));

    ChatCompletion {
        id: new_completion_id(),
        object: "chat.completion".to_string(),
        created: chrono::Utc::now().timestamp(),
        model: model.to_string(),
        choices,
        usage,
    }
}

fn build_choice(candidate: &Value, fallback_index: u32) -> Choice {
    let index = candidate
        .get("index")
        .and_then(|i| i.as_u64())
        .map_or(fallback_index, |i| i as u32);
    let message = candidate
        .get("content")
        .map(CanonicalMessage::from_native_content)
        .unwrap_or_else(|| CanonicalMessage::from_native_content(&Value::Null));

    let mut finish_reason = candidate
        .get("finishReason")
        .and_then(|f| f.as_str())
        .map(map_finish_reason)
        .unwrap_or(FinishReason::Stop);

    let tool_calls = if message.tool_calls.is_empty() {
        None
    } else {
        finish_reason = FinishReason::ToolCalls;
        Some(message.tool_calls.iter().map(|c| to_response_tool_call(c, None)).collect())
    };

    let text = message.text_content();
    Choice {
        index,
        message: ResponseMessage {
            role: "assistant".to_string(),
            content: if text.is_empty() && tool_calls.is_some() { None } else { Some(text) },
            reasoning_content: message.reasoning.clone(),
            tool_calls,
        },
        finish_reason: Some(finish_reason),
    }
}
