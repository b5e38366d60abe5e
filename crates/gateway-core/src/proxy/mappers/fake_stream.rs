//! Replay of a completed native response as a sequence of stream chunks.
//!
//! Reasoning is replayed first, then text, each in slices of
//! [`FAKE_STREAM_SLICE_CHARS`] characters. Function calls and media parts
//! ride on the last chunk together with `finishReason` and usage, so the
//! result reads like a real upstream stream to both renderers.

use serde_json::{json, Map, Value};

pub const FAKE_STREAM_SLICE_CHARS: usize = 50;

/// Split `response` (already unwrapped) into native chunks.
pub fn split_response(response: &Value) -> Vec<Value> {
    let candidate = response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
        .cloned()
        .unwrap_or_else(|| json!({}));

    let mut reasoning = String::new();
    let mut text = String::new();
    let mut trailing: Vec<Value> = Vec::new();
    for part in candidate.pointer("/content/parts").and_then(Value::as_array).into_iter().flatten() {
        match part.get("text").and_then(Value::as_str) {
            Some(t) if part.get("thought").and_then(Value::as_bool).unwrap_or(false) => {
                reasoning.push_str(t)
            },
            Some(t) => text.push_str(t),
            None => trailing.push(part.clone()),
        }
    }

    let mut slices: Vec<Value> = slice_chars(&reasoning)
        .into_iter()
        .map(|s| json!([{ "text": s, "thought": true }]))
        .chain(slice_chars(&text).into_iter().map(|s| json!([{ "text": s }])))
        .collect();

    match slices.last_mut().and_then(Value::as_array_mut) {
        Some(last) if !trailing.is_empty() => last.extend(trailing),
        Some(_) => {},
        None => slices.push(if trailing.is_empty() { json!([{ "text": "" }]) } else { Value::Array(trailing) }),
    }

    let index = candidate.get("index").cloned().unwrap_or_else(|| json!(0));
    let total = slices.len();
    slices
        .into_iter()
        .enumerate()
        .map(|(i, parts)| {
            let mut chunk_candidate = Map::new();
            chunk_candidate.insert("content".to_string(), json!({ "role": "model", "parts": parts }));
            chunk_candidate.insert("index".to_string(), index.clone());
            let mut chunk = Map::new();
            if i + 1 == total {
                for key in ["finishReason", "safetyRatings", "groundingMetadata"] {
                    if let Some(value) = candidate.get(key) {
                        chunk_candidate.insert(key.to_string(), value.clone());
                    }
                }
                for key in ["usageMetadata", "modelVersion", "responseId"] {
                    if let Some(value) = response.get(key) {
                        chunk.insert(key.to_string(), value.clone());
                    }
                }
            }
            chunk.insert("candidates".to_string(), json!([Value::Object(chunk_candidate)]));
            Value::Object(chunk)
        })
        .collect()
}

fn slice_chars(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(FAKE_STREAM_SLICE_CHARS).map(|c| c.iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(parts: Value) -> Value {
        json!({
            "candidates": [{"content": {"role": "model", "parts": parts}, "finishReason": "STOP", "index": 0}],
            "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 40, "totalTokenCount": 43}
        })
    }

    #[test]
    fn test_long_text_is_sliced_with_terminal_metadata_last() {
        let text = "x".repeat(120);
        let chunks = split_response(&response(json!([{"text": "why", "thought": true}, {"text": text}])));
        assert_eq!(chunks.len(), 4);

        assert_eq!(chunks[0]["candidates"][0]["content"]["parts"][0]["thought"], true);
        let joined: String = chunks[1..]
            .iter()
            .filter_map(|c| c["candidates"][0]["content"]["parts"][0]["text"].as_str())
            .collect();
        assert_eq!(joined, text);

        for chunk in &chunks[..3] {
            assert!(chunk["candidates"][0].get("finishReason").is_none());
            assert!(chunk.get("usageMetadata").is_none());
        }
        assert_eq!(chunks[3]["candidates"][0]["finishReason"], "STOP");
        assert_eq!(chunks[3]["usageMetadata"]["totalTokenCount"], 43);
    }

    #[test]
    fn test_multibyte_text_slices_on_char_boundaries() {
        let text = "抗".repeat(FAKE_STREAM_SLICE_CHARS + 1);
        let chunks = split_response(&response(json!([{"text": text}])));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1]["candidates"][0]["content"]["parts"][0]["text"], "抗");
    }

    #[test]
    fn test_function_call_rides_on_last_chunk() {
        let chunks = split_response(&response(json!([
            {"text": "Checking."},
            {"functionCall": {"name": "lookup", "args": {}}, "thoughtSignature": "c2ln"}
        ])));
        assert_eq!(chunks.len(), 1);
        let parts = &chunks[0]["candidates"][0]["content"]["parts"];
        assert_eq!(parts[0]["text"], "Checking.");
        assert_eq!(parts[1]["functionCall"]["name"], "lookup");
        assert_eq!(parts[1]["thoughtSignature"], "c2ln");
    }

    #[test]
    fn test_empty_response_still_yields_a_terminal_chunk() {
        let chunks = split_response(&json!({"candidates": [{"finishReason": "SAFETY"}]}));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0]["candidates"][0]["finishReason"], "SAFETY");
        assert_eq!(chunks[0]["candidates"][0]["content"]["parts"][0]["text"], "");
    }
}
