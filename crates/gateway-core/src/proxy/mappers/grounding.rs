//! Implicit search tool for search-augmented model variants.

use serde_json::{json, Value};

fn is_search_tool(tool: &Value) -> bool {
    tool.as_object()
        .is_some_and(|o| o.contains_key("googleSearch") || o.contains_key("googleSearchRetrieval"))
}

/// Add `{"googleSearch": {}}` to `tools` unless a search tool is already
/// present. User-declared function tools are kept alongside.
pub fn inject_google_search_tool(body: &mut Value) {
    let Some(obj) = body.as_object_mut() else {
        return;
    };
    let tools = obj.entry("tools").or_insert_with(|| json!([]));
    if !tools.is_array() {
        *tools = json!([]);
    }
    if let Some(list) = tools.as_array_mut() {
        if list.iter().any(is_search_tool) {
            tracing::debug!("Search tool already present, not injecting");
            return;
        }
        list.push(json!({ "googleSearch": {} }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injection_is_idempotent() {
        let mut body = json!({"contents": []});
        inject_google_search_tool(&mut body);
        inject_google_search_tool(&mut body);
        assert_eq!(body["tools"], json!([{"googleSearch": {}}]));
    }

    #[test]
    fn test_injection_keeps_function_tools() {
        let mut body = json!({"tools": [{"functionDeclarations": [{"name": "f"}]}]});
        inject_google_search_tool(&mut body);
        let tools = body["tools"].as_array().cloned().unwrap_or_default();
        assert_eq!(tools.len(), 2);
        assert!(tools[0].get("functionDeclarations").is_some());
        assert_eq!(tools[1], json!({"googleSearch": {}}));
    }

    #[test]
    fn test_existing_retrieval_tool_counts() {
        let mut body = json!({"tools": [{"googleSearchRetrieval": {}}]});
        inject_google_search_tool(&mut body);
        assert_eq!(body["tools"].as_array().map(|a| a.len()), Some(1));
    }
}
