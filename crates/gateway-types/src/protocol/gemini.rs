//! Google Gemini GenerateContent API types.

use serde::{Deserialize, Serialize};

use super::openai::{FinishReason, OpenAIUsage};

/// Gemini content role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GeminiRole {
    User,
    Model,
}

impl GeminiRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeminiRole::User => "user",
            GeminiRole::Model => "model",
        }
    }
}

/// Gemini usage metadata.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeminiUsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
    #[serde(default)]
    pub thoughts_token_count: u32,
    #[serde(default)]
    pub total_token_count: u32,
    #[serde(default)]
    pub cached_content_token_count: u32,
}

impl From<&GeminiUsageMetadata> for OpenAIUsage {
    fn from(usage: &GeminiUsageMetadata) -> Self {
        let completion = usage.candidates_token_count.saturating_add(usage.thoughts_token_count);
        let total = if usage.total_token_count > 0 {
            usage.total_token_count
        } else {
            usage.prompt_token_count.saturating_add(completion)
        };
        OpenAIUsage {
            prompt_tokens: usage.prompt_token_count,
            completion_tokens: completion,
            total_tokens: total,
        }
    }
}

/// Map a Gemini `finishReason` onto the OpenAI vocabulary.
pub fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "MAX_TOKENS" => FinishReason::Length,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => {
            FinishReason::ContentFilter
        },
        _ => FinishReason::Stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(map_finish_reason("STOP"), FinishReason::Stop);
        assert_eq!(map_finish_reason("MAX_TOKENS"), FinishReason::Length);
        assert_eq!(map_finish_reason("SAFETY"), FinishReason::ContentFilter);
        assert_eq!(map_finish_reason("RECITATION"), FinishReason::ContentFilter);
        assert_eq!(map_finish_reason("OTHER"), FinishReason::Stop);
    }

    #[test]
    fn test_usage_conversion() {
        let usage: GeminiUsageMetadata = serde_json::from_value(serde_json::json!({
            "promptTokenCount": 10,
            "candidatesTokenCount": 5,
            "thoughtsTokenCount": 2,
            "totalTokenCount": 17
        }))
        .unwrap_or_default();
        let openai = OpenAIUsage::from(&usage);
        assert_eq!(openai.prompt_tokens, 10);
        assert_eq!(openai.completion_tokens, 7);
        assert_eq!(openai.total_tokens, 17);
    }
}
