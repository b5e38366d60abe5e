//! v1internal envelope: requests travel as `{model, project, request, ...}`
//! and responses come back under `response`.

use serde_json::{json, Value};

/// Wrap a native request body for the v1internal endpoint.
///
/// `model` and routing fields are lifted out of the inner body; the
/// provider rejects them there.
pub fn wrap_request(body: &Value, model: &str, project_id: &str, user_agent: &str) -> Value {
    let mut inner = body.clone();
    if let Some(obj) = inner.as_object_mut() {
        obj.remove("model");
        obj.remove("stream");
    }
    json!({
        "model": model,
        "project": project_id,
        "requestId": format!("agent-{}", uuid::Uuid::new_v4()),
        "request": inner,
        "userAgent": user_agent,
    })
}

/// Strip the `response` envelope when present.
pub fn unwrap_response(mut body: Value) -> Value {
    match body.get_mut("response").map(Value::take) {
        Some(inner) if inner.is_object() => inner,
        _ => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_moves_model_out() {
        let body = json!({"model": "x", "contents": [{"role": "user", "parts": [{"text": "hi"}]}]});
        let wrapped = wrap_request(&body, "gemini-2.5-pro", "proj-1", "ua/1");
        assert_eq!(wrapped["model"], "gemini-2.5-pro");
        assert_eq!(wrapped["project"], "proj-1");
        assert_eq!(wrapped["userAgent"], "ua/1");
        assert!(wrapped["request"].get("model").is_none());
        assert_eq!(wrapped["request"]["contents"][0]["parts"][0]["text"], "hi");
        assert!(wrapped["requestId"].as_str().is_some_and(|s| s.starts_with("agent-")));
    }

    #[test]
    fn test_unwrap_response() {
        let wrapped = json!({"response": {"candidates": []}, "traceId": "t"});
        assert_eq!(unwrap_response(wrapped), json!({"candidates": []}));

        let plain = json!({"candidates": [{"index": 0}]});
        assert_eq!(unwrap_response(plain.clone()), plain);
    }
}
