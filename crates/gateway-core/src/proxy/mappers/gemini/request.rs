//! Native-format requests are forwarded largely verbatim. Only the pieces
//! the gateway owns are touched: declaration names are validated, schemas
//! cleaned, and model-name features applied.

use gateway_types::ProxyError;
use serde_json::Value;

use crate::proxy::mappers::canonical::ToolDeclaration;
use crate::proxy::mappers::model_features::ModelFeatures;

pub fn prepare_native_request(body: &Value, features: &ModelFeatures) -> Result<Value, ProxyError> {
    if !body.is_object() {
        return Err(ProxyError::InvalidRequest { message: "request body must be an object".to_string() });
    }
    if !body.get("contents").is_some_and(Value::is_array) {
        return Err(ProxyError::InvalidRequest { message: "`contents` must be an array".to_string() });
    }

    let mut request = body.clone();
    if let Some(tools) = request.get_mut("tools").and_then(|t| t.as_array_mut()) {
        for tool in tools.iter_mut() {
            let Some(decls) = tool.get_mut("functionDeclarations").and_then(|d| d.as_array_mut()) else {
                continue;
            };
            for decl in decls.iter_mut() {
                *decl = ToolDeclaration::from_native(decl)?.to_native();
            }
        }
    }

    features.apply_to_native(&mut request);
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body_with_tool(name: &str) -> Value {
        json!({
            "contents": [{"role": "user", "parts": [{"text": "weather?"}]}],
            "tools": [{"functionDeclarations": [{
                "name": name,
                "description": "d",
                "parametersJsonSchema": {"type": "object", "$schema": "x", "properties": {"location": {"type": "string"}}}
            }]}],
            "cachedContent": "cachedContents/abc"
        })
    }

    #[test]
    fn test_passthrough_with_cleaned_schema() {
        let features = ModelFeatures::parse("gemini-2.5-pro");
        let out = prepare_native_request(&body_with_tool("get_weather"), &features)
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(out["cachedContent"], "cachedContents/abc");
        assert_eq!(
            out["tools"][0]["functionDeclarations"][0]["parameters"],
            json!({"type": "object", "properties": {"location": {"type": "string"}}})
        );
        assert!(out.get("generationConfig").is_none());
    }

    #[test]
    fn test_invalid_declaration_name() {
        let features = ModelFeatures::parse("gemini-2.5-pro");
        let err = prepare_native_request(&body_with_tool("123bad"), &features).err();
        assert_eq!(err, Some(ProxyError::InvalidToolName { name: "123bad".to_string() }));
    }

    #[test]
    fn test_search_and_thinking_features() {
        let features = ModelFeatures::parse("gemini-2.5-flash-nothinking-search");
        let out = prepare_native_request(&body_with_tool("get_weather"), &features)
            .unwrap_or_else(|e| panic!("{e}"));
        let tools = out["tools"].as_array().cloned().unwrap_or_default();
        assert_eq!(tools.len(), 2);
        assert_eq!(out["generationConfig"]["thinkingConfig"]["thinkingBudget"], 0);
    }

    #[test]
    fn test_missing_contents_rejected() {
        let features = ModelFeatures::parse("gemini-2.5-pro");
        let err = prepare_native_request(&json!({"messages": []}), &features).err();
        assert!(matches!(err, Some(ProxyError::InvalidRequest { .. })));
    }
}
