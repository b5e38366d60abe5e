//! Structural detection of the inbound wire format.

use gateway_types::ProxyError;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundFormat {
    /// OpenAI ChatCompletions (`messages[]`)
    OpenAI,
    /// Native GenerateContent (`contents[]` of `parts`)
    Native,
}

impl InboundFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            InboundFormat::OpenAI => "openai",
            InboundFormat::Native => "native",
        }
    }
}

/// `contents[]` wins over `messages[]` when a body carries both.
pub fn detect_format(body: &Value) -> Result<InboundFormat, ProxyError> {
    let Some(obj) = body.as_object() else {
        return Err(ProxyError::InvalidRequest {
            message: "request body must be a JSON object".to_string(),
        });
    };

    if obj.get("contents").is_some_and(Value::is_array) {
        return Ok(InboundFormat::Native);
    }
    if obj.get("messages").is_some_and(Value::is_array) {
        return Ok(InboundFormat::OpenAI);
    }
    Err(ProxyError::InvalidRequest {
        message: "request carries neither messages[] nor contents[]".to_string(),
    })
}
