//! Sampling parameters: OpenAI request fields onto native `generationConfig`.

use serde_json::{json, Map, Value};

use super::model_features::ModelFeatures;
use super::openai::OpenAIRequest;

pub fn build_generation_config(request: &OpenAIRequest, features: &ModelFeatures) -> Value {
    let mut config = Map::new();

    if let Some(t) = request.temperature {
        config.insert("temperature".to_string(), json!(t));
    }
    if let Some(p) = request.top_p {
        config.insert("topP".to_string(), json!(p));
    }
    if let Some(k) = request.top_k {
        config.insert("topK".to_string(), json!(k));
    }
    if let Some(max) = request.max_completion_tokens.or(request.max_tokens) {
        config.insert("maxOutputTokens".to_string(), json!(max));
    }
    if let Some(stop) = &request.stop {
        let sequences: Vec<Value> = match stop {
            Value::String(s) => vec![json!(s)],
            Value::Array(items) => items.iter().filter(|v| v.is_string()).cloned().collect(),
            _ => Vec::new(),
        };
        if !sequences.is_empty() {
            config.insert("stopSequences".to_string(), Value::Array(sequences));
        }
    }
    if let Some(f) = request.frequency_penalty {
        config.insert("frequencyPenalty".to_string(), json!(f));
    }
    if let Some(p) = request.presence_penalty {
        config.insert("presencePenalty".to_string(), json!(p));
    }
    if let Some(n) = request.n {
        config.insert("candidateCount".to_string(), json!(n));
    }
    if let Some(seed) = request.seed {
        config.insert("seed".to_string(), json!(seed));
    }

    if let Some(format) = &request.response_format {
        match format.get("type").and_then(|t| t.as_str()) {
            Some("json_object") => {
                config.insert("responseMimeType".to_string(), json!("application/json"));
            },
            Some("json_schema") => {
                config.insert("responseMimeType".to_string(), json!("application/json"));
                if let Some(schema) = format.get("json_schema").and_then(|s| s.get("schema")) {
                    config.insert(
                        "responseSchema".to_string(),
                        super::tool_schema::clean_schema(schema),
                    );
                }
            },
            _ => {},
        }
    }

    if let Some(thinking) = features.thinking_config() {
        config.insert("thinkingConfig".to_string(), thinking);
    }

    Value::Object(config)
}
