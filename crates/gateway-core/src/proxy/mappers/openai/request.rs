//! OpenAI chat request → canonical messages → native request body.

use gateway_types::ProxyError;
use serde_json::{json, Value};
use std::collections::HashMap;

use super::models::{OpenAIContent, OpenAIContentBlock, OpenAIMessage, OpenAIRequest, OpenAIToolCall};
use crate::proxy::mappers::canonical::{
    declarations_to_native_tools, split_tool_call_id, CanonicalMessage, CanonicalPart, CanonicalRole,
    ToolCall, ToolDeclaration, ToolLinkage, ToolPolicy,
};
use crate::proxy::mappers::generation_config::build_generation_config;
use crate::proxy::mappers::grounding::inject_google_search_tool;
use crate::proxy::mappers::model_features::ModelFeatures;

/// Sent when the conversation carries only system instructions.
const DEFAULT_USER_PROMPT: &str = "Please answer according to the system instructions.";

pub fn build_gemini_request(
    request: &OpenAIRequest,
    features: &ModelFeatures,
) -> Result<Value, ProxyError> {
    // Declarations are validated before anything else so a bad name never
    // costs an upstream call.
    let declarations = request
        .tools
        .iter()
        .flatten()
        .map(ToolDeclaration::from_openai)
        .collect::<Result<Vec<_>, _>>()?;

    let (system_texts, messages) = to_canonical(&request.messages)?;

    let mut contents: Vec<Value> = Vec::new();
    for message in &messages {
        let turn = message.to_native();
        let parts_empty = turn["parts"].as_array().map_or(true, |p| p.is_empty());
        if parts_empty {
            continue;
        }
        merge_turn(&mut contents, turn);
    }
    if contents.is_empty() {
        contents.push(json!({ "role": "user", "parts": [{ "text": DEFAULT_USER_PROMPT }] }));
    }

    let mut body = json!({
        "contents": contents,
        "generationConfig": build_generation_config(request, features),
    });
    if !system_texts.is_empty() {
        body["systemInstruction"] = json!({ "parts": [{ "text": system_texts.join("\n\n") }] });
    }
    if let Some(tools) = declarations_to_native_tools(&declarations) {
        body["tools"] = tools;
    }
    if let Some(policy) = request.tool_choice.as_ref().and_then(ToolPolicy::from_openai) {
        body["toolConfig"] = policy.to_tool_config();
    }
    if features.search {
        inject_google_search_tool(&mut body);
    }
    Ok(body)
}

/// Consecutive turns with the same native role are merged into one.
fn merge_turn(contents: &mut Vec<Value>, turn: Value) {
    if let Some(last) = contents.last_mut() {
        if last["role"] == turn["role"] {
            if let (Some(dst), Some(src)) = (last["parts"].as_array_mut(), turn["parts"].as_array()) {
                dst.extend(src.iter().cloned());
                return;
            }
        }
    }
    contents.push(turn);
}

fn to_canonical(
    messages: &[OpenAIMessage],
) -> Result<(Vec<String>, Vec<CanonicalMessage>), ProxyError> {
    let mut system_texts = Vec::new();
    let mut out = Vec::with_capacity(messages.len());
    // call id → function name, for linking tool results
    let mut issued_calls: HashMap<String, String> = HashMap::new();

    for (index, msg) in messages.iter().enumerate() {
        let role = CanonicalRole::from_openai(&msg.role).ok_or_else(|| ProxyError::InvalidRequest {
            message: format!("messages[{}]: unsupported role '{}'", index, msg.role),
        })?;

        match role {
            CanonicalRole::System => {
                let text = content_text(msg.content.as_ref());
                if !text.is_empty() {
                    system_texts.push(text);
                }
            },
            CanonicalRole::Tool => {
                let name = msg.name.clone().filter(|n| !n.is_empty()).ok_or_else(|| {
                    ProxyError::MissingToolName { tool_call_id: msg.tool_call_id.clone() }
                })?;
                // The function response answers the plain id; the signature
                // only travels back on the call itself.
                let wire_id = msg.tool_call_id.as_deref().unwrap_or_default();
                let call_id = split_tool_call_id(wire_id).0.to_string();
                match issued_calls.get(&call_id) {
                    Some(issued) if *issued == name => {},
                    Some(issued) => tracing::warn!(
                        "Tool result {} names '{}' but the call was '{}'",
                        call_id,
                        name,
                        issued
                    ),
                    None => tracing::warn!("Tool result {} has no preceding tool call", call_id),
                }
                let mut canonical =
                    CanonicalMessage::text(CanonicalRole::Tool, content_text(msg.content.as_ref()));
                canonical.linkage = Some(ToolLinkage { call_id, name });
                out.push(canonical);
            },
            CanonicalRole::User | CanonicalRole::Assistant => {
                let mut canonical = CanonicalMessage::new(role);
                canonical.parts = content_parts(msg.content.as_ref());
                if let Some(calls) = msg.tool_calls.as_ref().filter(|c| !c.is_empty()) {
                    canonical.tool_calls = resolve_tool_calls(calls);
                    if canonical.tool_calls.is_empty() && !canonical.has_text() {
                        return Err(ProxyError::UnresolvableToolTurn { index });
                    }
                    for call in &canonical.tool_calls {
                        issued_calls.insert(call.id.clone(), call.name.clone());
                    }
                }
                out.push(canonical);
            },
        }
    }
    Ok((system_texts, out))
}

/// Calls whose arguments do not parse, or that lack a name, are dropped.
fn resolve_tool_calls(calls: &[OpenAIToolCall]) -> Vec<ToolCall> {
    calls
        .iter()
        .filter_map(|call| {
            let Some(name) = call.function.name.as_deref().filter(|n| !n.is_empty()) else {
                tracing::warn!("Dropping tool call without a function name");
                return None;
            };
            let arguments = match &call.function.arguments {
                Value::String(raw) if raw.trim().is_empty() => json!({}),
                Value::String(raw) => match serde_json::from_str::<Value>(raw) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        tracing::warn!("Dropping tool call '{}': unparseable arguments ({})", name, e);
                        return None;
                    },
                },
                Value::Null => json!({}),
                other => other.clone(),
            };
            let mut resolved = ToolCall::new(name, arguments);
            if let Some(wire_id) = call.id.as_deref().filter(|id| !id.is_empty()) {
                let (id, signature) = split_tool_call_id(wire_id);
                resolved.id = id.to_string();
                resolved.thought_signature = signature.map(|s| s.to_string());
            }
            Some(resolved)
        })
        .collect()
}

fn content_text(content: Option<&OpenAIContent>) -> String {
    match content {
        Some(OpenAIContent::String(s)) => s.clone(),
        Some(OpenAIContent::Array(blocks)) => blocks
            .iter()
            .filter_map(|b| match b {
                OpenAIContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Some(OpenAIContent::Other(Value::Null)) | None => String::new(),
        Some(OpenAIContent::Other(value)) => value.to_string(),
    }
}

fn content_parts(content: Option<&OpenAIContent>) -> Vec<CanonicalPart> {
    match content {
        Some(OpenAIContent::String(s)) if !s.is_empty() => vec![CanonicalPart::Text(s.clone())],
        Some(OpenAIContent::Array(blocks)) => blocks.iter().filter_map(block_to_part).collect(),
        Some(OpenAIContent::Other(value)) if !value.is_null() => vec![CanonicalPart::Text(value.to_string())],
        _ => Vec::new(),
    }
}

fn block_to_part(block: &OpenAIContentBlock) -> Option<CanonicalPart> {
    match block {
        OpenAIContentBlock::Text { text } => Some(CanonicalPart::Text(text.clone())),
        OpenAIContentBlock::ImageUrl { image_url } => {
            let url = image_url.url.as_str();
            if let Some(rest) = url.strip_prefix("data:") {
                let (meta, data) = rest.split_once(',')?;
                let mime_type = meta.split(';').next().unwrap_or("image/png");
                Some(CanonicalPart::InlineData {
                    mime_type: mime_type.to_string(),
                    data: data.to_string(),
                })
            } else if url.starts_with("gs://") || url.starts_with("https://") {
                Some(CanonicalPart::FileData {
                    mime_type: guess_mime_type(url).to_string(),
                    file_uri: url.to_string(),
                })
            } else {
                tracing::debug!("Skipping image with unsupported url scheme");
                None
            }
        },
        OpenAIContentBlock::Unsupported => None,
    }
}

fn guess_mime_type(url: &str) -> &'static str {
    let lower = url.to_ascii_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or_default();
    if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        "image/jpeg"
    } else if path.ends_with(".webp") {
        "image/webp"
    } else if path.ends_with(".gif") {
        "image/gif"
    } else {
        "image/png"
    }
}
