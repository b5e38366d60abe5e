//! Follow-up request construction and native response surgery.

use serde_json::{json, Value};

use super::done_marker::DONE_MARKER;

const CONTINUATION_PROMPT: &str = "Your previous answer was cut off. Continue exactly where it \
stopped. Do not repeat anything already written and do not add any preamble.";

/// Original conversation + the partial answer as a model turn + a user
/// turn asking to continue.
pub fn build_continuation_request(original: &Value, partial_text: &str, done_mode: bool) -> Value {
    let mut request = original.clone();
    let mut prompt = CONTINUATION_PROMPT.to_string();
    if done_mode {
        prompt.push_str(&format!(
            " When the whole answer is complete, output {} on its own final line.",
            DONE_MARKER
        ));
    }
    if !request.get("contents").is_some_and(Value::is_array) {
        request["contents"] = json!([]);
    }
    if let Some(contents) = request.get_mut("contents").and_then(|c| c.as_array_mut()) {
        if !partial_text.is_empty() {
            contents.push(json!({ "role": "model", "parts": [{ "text": partial_text }] }));
        }
        contents.push(json!({ "role": "user", "parts": [{ "text": prompt }] }));
    }
    request
}

fn candidate_parts_mut(chunk: &mut Value) -> Option<&mut Vec<Value>> {
    chunk
        .get_mut("candidates")?
        .get_mut(0)?
        .get_mut("content")?
        .get_mut("parts")?
        .as_array_mut()
}

fn is_visible_text(part: &Value) -> bool {
    part.get("text").is_some() && !part.get("thought").and_then(|t| t.as_bool()).unwrap_or(false)
}

/// Replace the visible text of candidate 0 with `text`, keeping thought and
/// function-call parts in place. An empty `text` removes the text parts.
pub fn replace_candidate_text(chunk: &mut Value, text: &str) {
    let Some(parts) = candidate_parts_mut(chunk) else {
        if !text.is_empty() {
            tracing::debug!("Chunk without candidate content; dropping {} chars", text.len());
        }
        return;
    };
    let first_text = parts.iter().position(is_visible_text);
    let mut kept: Vec<Value> = Vec::with_capacity(parts.len());
    for (i, part) in parts.drain(..).enumerate() {
        if Some(i) == first_text && !text.is_empty() {
            kept.push(json!({ "text": text }));
        }
        if !is_visible_text(&part) {
            kept.push(part);
        }
    }
    if first_text.is_none() && !text.is_empty() {
        kept.push(json!({ "text": text }));
    }
    *parts = kept;
}

/// True when candidate 0 still has parts worth sending.
pub fn has_parts(chunk: &Value) -> bool {
    chunk
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .is_some_and(|p| !p.is_empty())
}

/// Drop the finish reason and usage so a chunk reads as mid-stream.
pub fn strip_terminal(chunk: &mut Value) {
    if let Some(candidate) = chunk.get_mut("candidates").and_then(|c| c.get_mut(0)) {
        if let Some(obj) = candidate.as_object_mut() {
            obj.remove("finishReason");
        }
    }
    if let Some(obj) = chunk.as_object_mut() {
        obj.remove("usageMetadata");
    }
}

pub fn set_finish_reason(chunk: &mut Value, reason: &str) {
    if let Some(candidate) = chunk.get_mut("candidates").and_then(|c| c.get_mut(0)) {
        if candidate.is_object() {
            candidate["finishReason"] = json!(reason);
        }
    }
}

/// Minimal text-only chunk.
pub fn text_chunk(text: &str) -> Value {
    json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] }, "index": 0 }] })
}

/// Minimal terminal chunk.
pub fn finish_chunk(reason: &str) -> Value {
    json!({ "candidates": [{ "content": { "role": "model", "parts": [] }, "finishReason": reason, "index": 0 }] })
}

/// Sum output-side token counters of `extra` into `target`.
pub fn add_usage(target: &mut Value, extra: &Value) {
    let Some(extra_usage) = extra.get("usageMetadata") else {
        return;
    };
    if target.get("usageMetadata").is_none() {
        target["usageMetadata"] = extra_usage.clone();
        return;
    }
    for key in ["candidatesTokenCount", "thoughtsTokenCount", "totalTokenCount"] {
        let add = extra_usage.get(key).and_then(|v| v.as_u64()).unwrap_or(0);
        if add == 0 {
            continue;
        }
        let current = target["usageMetadata"].get(key).and_then(|v| v.as_u64()).unwrap_or(0);
        target["usageMetadata"][key] = json!(current + add);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuation_request_shape() {
        let original = json!({"contents": [{"role": "user", "parts": [{"text": "write an essay"}]}], "generationConfig": {"temperature": 1}});
        let req = build_continuation_request(&original, "Once upon", false);
        let contents = req["contents"].as_array().cloned().unwrap_or_default();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1], json!({"role": "model", "parts": [{"text": "Once upon"}]}));
        assert_eq!(contents[2]["role"], "user");
        assert!(contents[2]["parts"][0]["text"].as_str().is_some_and(|t| !t.contains(DONE_MARKER)));
        assert_eq!(req["generationConfig"], original["generationConfig"]);

        let done = build_continuation_request(&original, "", true);
        assert_eq!(done["contents"].as_array().map(|c| c.len()), Some(2));
        assert!(done["contents"][1]["parts"][0]["text"].as_str().is_some_and(|t| t.contains(DONE_MARKER)));
    }

    #[test]
    fn test_replace_text_keeps_other_parts() {
        let mut chunk = json!({"candidates": [{"content": {"parts": [
            {"text": "why", "thought": true},
            {"text": "a"},
            {"text": "b"},
            {"functionCall": {"name": "f"}}
        ]}}]});
        replace_candidate_text(&mut chunk, "merged");
        assert_eq!(
            chunk["candidates"][0]["content"]["parts"],
            json!([{"text": "why", "thought": true}, {"text": "merged"}, {"functionCall": {"name": "f"}}])
        );

        replace_candidate_text(&mut chunk, "");
        assert_eq!(chunk["candidates"][0]["content"]["parts"].as_array().map(|p| p.len()), Some(2));
    }

    #[test]
    fn test_strip_terminal_and_usage_sum() {
        let mut first = json!({"candidates": [{"finishReason": "MAX_TOKENS"}], "usageMetadata": {"promptTokenCount": 5, "candidatesTokenCount": 10, "totalTokenCount": 15}});
        let second = json!({"usageMetadata": {"promptTokenCount": 20, "candidatesTokenCount": 4, "totalTokenCount": 24}});
        add_usage(&mut first, &second);
        assert_eq!(first["usageMetadata"]["candidatesTokenCount"], 14);
        assert_eq!(first["usageMetadata"]["promptTokenCount"], 5);
        strip_terminal(&mut first);
        assert!(first["candidates"][0].get("finishReason").is_none());
        assert!(first.get("usageMetadata").is_none());
    }
}
