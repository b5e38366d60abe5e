//! Format-independent representation shared by both translation directions.

use gateway_types::ProxyError;
use serde_json::{json, Map, Value};

use super::tool_schema::{clean_schema, validate_tool_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalRole {
    System,
    User,
    Assistant,
    Tool,
}

impl CanonicalRole {
    /// OpenAI role string; `developer` is folded into `system`, `function` into `tool`.
    pub fn from_openai(role: &str) -> Option<Self> {
        match role {
            "system" | "developer" => Some(Self::System),
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            "tool" | "function" => Some(Self::Tool),
            _ => None,
        }
    }

    /// Native role. Tool results travel on a user turn.
    pub fn native_role(&self) -> &'static str {
        match self {
            Self::Assistant => "model",
            Self::System | Self::User | Self::Tool => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalPart {
    Text(String),
    InlineData { mime_type: String, data: String },
    FileData { mime_type: String, file_uri: String },
}

impl CanonicalPart {
    pub fn to_native(&self) -> Value {
        match self {
            Self::Text(text) => json!({ "text": text }),
            Self::InlineData { mime_type, data } => {
                json!({ "inlineData": { "mimeType": mime_type, "data": data } })
            },
            Self::FileData { mime_type, file_uri } => {
                json!({ "fileData": { "mimeType": mime_type, "fileUri": file_uri } })
            },
        }
    }
}

/// One function invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Always a JSON value here; string-encoded only on the OpenAI wire.
    pub arguments: Value,
    /// Opaque `thoughtSignature` the model attached to the call part. It must
    /// be sent back with the call on the next turn.
    pub thought_signature: Option<String>,
}

/// Joins a call id and its thought signature in OpenAI-facing ids.
pub const THOUGHT_SIGNATURE_SEPARATOR: &str = "__thought__";

/// Split an OpenAI-facing call id into the plain id and its thought signature.
pub fn split_tool_call_id(wire_id: &str) -> (&str, Option<&str>) {
    match wire_id.split_once(THOUGHT_SIGNATURE_SEPARATOR) {
        Some((id, signature)) if !signature.is_empty() => (id, Some(signature)),
        Some((id, _)) => (id, None),
        None => (wire_id, None),
    }
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self { id: generate_tool_call_id(), name: name.into(), arguments, thought_signature: None }
    }

    /// Lift a native `functionCall` part under a freshly generated id. Returns
    /// `None` for parts that carry no call.
    pub fn from_native_part(part: &Value) -> Option<Self> {
        let function_call = part.get("functionCall")?;
        let name = function_call
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown_function");
        let arguments = function_call.get("args").cloned().unwrap_or_else(|| json!({}));
        let mut call = Self::new(name, arguments);
        call.thought_signature = part
            .get("thoughtSignature")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());
        Some(call)
    }

    /// Native part; the signature rides next to `functionCall`, not inside it.
    pub fn to_native(&self) -> Value {
        let mut part = json!({ "functionCall": { "id": self.id, "name": self.name, "args": self.arguments } });
        if let Some(signature) = &self.thought_signature {
            part["thoughtSignature"] = json!(signature);
        }
        part
    }

    /// Id shown to OpenAI clients, with the thought signature folded in so it
    /// survives a round trip through clients that only echo ids.
    pub fn wire_id(&self) -> String {
        match &self.thought_signature {
            Some(signature) => format!("{}{}{}", self.id, THOUGHT_SIGNATURE_SEPARATOR, signature),
            None => self.id.clone(),
        }
    }

    /// `arguments` encoded the way OpenAI clients expect.
    pub fn arguments_string(&self) -> String {
        match &self.arguments {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// `call_` followed by 24 hex characters.
pub fn generate_tool_call_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("call_{}", &hex[..24])
}

/// Which call a tool-role message answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolLinkage {
    pub call_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalMessage {
    pub role: CanonicalRole,
    pub parts: Vec<CanonicalPart>,
    pub tool_calls: Vec<ToolCall>,
    /// Set only on tool-role messages
    pub linkage: Option<ToolLinkage>,
    pub reasoning: Option<String>,
}

impl CanonicalMessage {
    pub fn new(role: CanonicalRole) -> Self {
        Self { role, parts: Vec::new(), tool_calls: Vec::new(), linkage: None, reasoning: None }
    }

    pub fn text(role: CanonicalRole, text: impl Into<String>) -> Self {
        let mut msg = Self::new(role);
        msg.parts.push(CanonicalPart::Text(text.into()));
        msg
    }

    /// Concatenated text parts.
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                CanonicalPart::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_text(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, CanonicalPart::Text(t) if !t.is_empty()))
    }

    /// Native `{role, parts}` turn.
    ///
    /// A tool message becomes a `functionResponse` on a user turn; its content
    /// is sent as parsed JSON when it is an object, otherwise wrapped as
    /// `{"result": ...}`.
    pub fn to_native(&self) -> Value {
        let mut parts: Vec<Value> = Vec::new();
        if let Some(link) = &self.linkage {
            let raw = self.text_content();
            let response = match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(obj)) => Value::Object(obj),
                _ => json!({ "result": raw }),
            };
            parts.push(json!({
                "functionResponse": { "id": link.call_id, "name": link.name, "response": response }
            }));
        } else {
            parts.extend(self.parts.iter().map(CanonicalPart::to_native));
            parts.extend(self.tool_calls.iter().map(ToolCall::to_native));
        }
        json!({ "role": self.role.native_role(), "parts": parts })
    }

    /// Lift a native candidate `content` into an assistant message.
    ///
    /// Thought parts are routed to `reasoning`; text parts concatenate in order.
    pub fn from_native_content(content: &Value) -> Self {
        let mut msg = Self::new(CanonicalRole::Assistant);
        let mut text = String::new();
        let mut reasoning = String::new();
        for part in content.get("parts").and_then(|p| p.as_array()).into_iter().flatten() {
            if let Some(call) = ToolCall::from_native_part(part) {
                msg.tool_calls.push(call);
                continue;
            }
            let Some(t) = part.get("text").and_then(|v| v.as_str()) else {
                continue;
            };
            if part.get("thought").and_then(|v| v.as_bool()).unwrap_or(false) {
                reasoning.push_str(t);
            } else {
                text.push_str(t);
            }
        }
        if !text.is_empty() {
            msg.parts.push(CanonicalPart::Text(text));
        }
        if !reasoning.is_empty() {
            msg.reasoning = Some(reasoning);
        }
        msg
    }
}

/// A function the model may call. Constructed once at the request boundary
/// from either wire shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: Option<String>,
    /// JSON schema exactly as the client sent it
    pub parameters: Option<Value>,
}

impl ToolDeclaration {
    /// Accepts `{type:"function", function:{...}}` and the flat `{name, ...}` form.
    pub fn from_openai(tool: &Value) -> Result<Self, ProxyError> {
        let func = tool.get("function").unwrap_or(tool);
        Self::from_fields(func, "parameters")
    }

    /// A native `functionDeclarations` entry (`parametersJsonSchema` accepted too).
    pub fn from_native(decl: &Value) -> Result<Self, ProxyError> {
        let key = if decl.get("parameters").is_none() && decl.get("parametersJsonSchema").is_some() {
            "parametersJsonSchema"
        } else {
            "parameters"
        };
        Self::from_fields(decl, key)
    }

    fn from_fields(obj: &Value, params_key: &str) -> Result<Self, ProxyError> {
        let name = obj.get("name").and_then(|v| v.as_str()).unwrap_or_default();
        validate_tool_name(name)?;
        Ok(Self {
            name: name.to_string(),
            description: obj.get("description").and_then(|v| v.as_str()).map(|s| s.to_string()),
            parameters: obj.get(params_key).cloned(),
        })
    }

    pub fn to_openai(&self) -> Value {
        let mut func = Map::new();
        func.insert("name".to_string(), json!(self.name));
        if let Some(desc) = &self.description {
            func.insert("description".to_string(), json!(desc));
        }
        if let Some(params) = &self.parameters {
            func.insert("parameters".to_string(), params.clone());
        }
        json!({ "type": "function", "function": Value::Object(func) })
    }

    /// Native declaration with the schema cleaned of keys the provider rejects.
    pub fn to_native(&self) -> Value {
        let mut decl = Map::new();
        decl.insert("name".to_string(), json!(self.name));
        decl.insert("description".to_string(), json!(self.description.clone().unwrap_or_default()));
        if let Some(params) = &self.parameters {
            let cleaned = clean_schema(params);
            if cleaned.as_object().is_some_and(|o| !o.is_empty()) {
                decl.insert("parameters".to_string(), cleaned);
            }
        }
        Value::Object(decl)
    }
}

/// Group every declaration into a single native tool entry.
pub fn declarations_to_native_tools(declarations: &[ToolDeclaration]) -> Option<Value> {
    if declarations.is_empty() {
        return None;
    }
    let decls: Vec<Value> = declarations.iter().map(ToolDeclaration::to_native).collect();
    Some(json!([{ "functionDeclarations": decls }]))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolMode {
    Auto,
    None,
    Any,
}

impl ToolMode {
    pub fn as_native(&self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::None => "NONE",
            Self::Any => "ANY",
        }
    }
}

/// Tool-choice policy: a mode plus an optional single-name allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPolicy {
    pub mode: ToolMode,
    pub allowed_function_names: Option<Vec<String>>,
}

impl ToolPolicy {
    /// `"auto" | "none" | "required"` or `{type:"function", function:{name}}`.
    pub fn from_openai(choice: &Value) -> Option<Self> {
        match choice {
            Value::String(s) => {
                let mode = match s.as_str() {
                    "auto" => ToolMode::Auto,
                    "none" => ToolMode::None,
                    "required" | "any" => ToolMode::Any,
                    other => {
                        tracing::debug!("Ignoring unknown tool_choice '{}'", other);
                        return None;
                    },
                };
                Some(Self { mode, allowed_function_names: None })
            },
            Value::Object(_) => {
                let name = choice
                    .get("function")
                    .and_then(|f| f.get("name"))
                    .or_else(|| choice.get("name"))
                    .and_then(|v| v.as_str())?;
                Some(Self { mode: ToolMode::Any, allowed_function_names: Some(vec![name.to_string()]) })
            },
            _ => None,
        }
    }

    pub fn to_tool_config(&self) -> Value {
        let mut config = json!({ "mode": self.mode.as_native() });
        if let Some(names) = &self.allowed_function_names {
            config["allowedFunctionNames"] = json!(names);
        }
        json!({ "functionCallingConfig": config })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_call_id_shape() {
        let id = generate_tool_call_id();
        assert!(id.starts_with("call_"));
        assert_eq!(id.len(), 5 + 24);
        assert!(id[5..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_declaration_openai_round_trip_is_exact() {
        let tool = json!({
            "type": "function",
            "function": {
                "name": "get_weather",
                "description": "Look up the weather",
                "parameters": {
                    "type": "object",
                    "$schema": "http://json-schema.org/draft-07/schema#",
                    "properties": {"location": {"type": "string"}},
                    "required": ["location"],
                    "additionalProperties": false
                }
            }
        });
        let decl = ToolDeclaration::from_openai(&tool).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(decl.to_openai(), tool);
    }

    #[test]
    fn test_declaration_to_native_shape() {
        let tool = json!({"type": "function", "function": {
            "name": "get_weather",
            "description": "Look up the weather",
            "parameters": {"type": "object", "properties": {"location": {"type": "string"}}, "additionalProperties": false}
        }});
        let native = ToolDeclaration::from_openai(&tool).map(|d| d.to_native()).unwrap_or_default();
        assert_eq!(
            native,
            json!({
                "name": "get_weather",
                "description": "Look up the weather",
                "parameters": {"type": "object", "properties": {"location": {"type": "string"}}}
            })
        );
        let back = ToolDeclaration::from_native(&native).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(back.name, "get_weather");
        assert_eq!(back.parameters, native.get("parameters").cloned());
    }

    #[test]
    fn test_invalid_name_rejected_at_boundary() {
        let tool = json!({"type": "function", "function": {"name": "123bad"}});
        assert_eq!(
            ToolDeclaration::from_openai(&tool),
            Err(ProxyError::InvalidToolName { name: "123bad".to_string() })
        );
    }

    #[test]
    fn test_tool_choice_policies() {
        assert_eq!(ToolPolicy::from_openai(&json!("auto")).map(|p| p.mode), Some(ToolMode::Auto));
        assert_eq!(ToolPolicy::from_openai(&json!("none")).map(|p| p.mode), Some(ToolMode::None));
        assert_eq!(ToolPolicy::from_openai(&json!("required")).map(|p| p.mode), Some(ToolMode::Any));

        let specific = ToolPolicy::from_openai(&json!({"type": "function", "function": {"name": "get_weather"}}))
            .unwrap_or_else(|| panic!("policy expected"));
        assert_eq!(
            specific.to_tool_config(),
            json!({"functionCallingConfig": {"mode": "ANY", "allowedFunctionNames": ["get_weather"]}})
        );
    }

    #[test]
    fn test_tool_result_becomes_user_function_response() {
        let mut msg = CanonicalMessage::text(CanonicalRole::Tool, r#"{"temp": 21}"#);
        msg.linkage = Some(ToolLinkage { call_id: "call_1".to_string(), name: "get_weather".to_string() });
        assert_eq!(
            msg.to_native(),
            json!({"role": "user", "parts": [{"functionResponse": {
                "id": "call_1", "name": "get_weather", "response": {"temp": 21}
            }}]})
        );

        let mut plain = CanonicalMessage::text(CanonicalRole::Tool, "sunny");
        plain.linkage = Some(ToolLinkage { call_id: "call_2".to_string(), name: "get_weather".to_string() });
        assert_eq!(plain.to_native()["parts"][0]["functionResponse"]["response"], json!({"result": "sunny"}));
    }

    #[test]
    fn test_native_content_splits_thoughts_and_calls() {
        let content = json!({"role": "model", "parts": [
            {"text": "thinking...", "thought": true},
            {"text": "Hello "},
            {"text": "world"},
            {"functionCall": {"name": "lookup", "args": {"q": "x"}}}
        ]});
        let msg = CanonicalMessage::from_native_content(&content);
        assert_eq!(msg.text_content(), "Hello world");
        assert_eq!(msg.reasoning.as_deref(), Some("thinking..."));
        assert_eq!(msg.tool_calls.len(), 1);
        assert_eq!(msg.tool_calls[0].name, "lookup");
        assert_eq!(msg.tool_calls[0].arguments_string(), r#"{"q":"x"}"#);
    }

    #[test]
    fn test_nameless_function_call_fallback() {
        let call = ToolCall::from_native_part(&json!({"functionCall": {"args": {}}}))
            .unwrap_or_else(|| panic!("call part not lifted"));
        assert_eq!(call.name, "unknown_function");
        assert!(ToolCall::from_native_part(&json!({"text": "hi"})).is_none());
    }

    #[test]
    fn test_thought_signature_survives_the_wire_id() {
        let part = json!({
            "functionCall": {"name": "search", "args": {"q": "x"}},
            "thoughtSignature": "c2lnbmF0dXJl"
        });
        let call = ToolCall::from_native_part(&part).unwrap_or_else(|| panic!("call part not lifted"));
        assert_eq!(call.thought_signature.as_deref(), Some("c2lnbmF0dXJl"));

        let wire_id = call.wire_id();
        assert_eq!(wire_id, format!("{}__thought__c2lnbmF0dXJl", call.id));
        assert_eq!(split_tool_call_id(&wire_id), (call.id.as_str(), Some("c2lnbmF0dXJl")));

        let native = call.to_native();
        assert_eq!(native["thoughtSignature"], "c2lnbmF0dXJl");
        assert_eq!(native["functionCall"]["id"], call.id.as_str());
    }

    #[test]
    fn test_plain_ids_split_without_signature() {
        assert_eq!(split_tool_call_id("call_abc"), ("call_abc", None));
        assert_eq!(split_tool_call_id("call_abc__thought__"), ("call_abc", None));
        let call = ToolCall::new("noop", json!({}));
        assert_eq!(call.wire_id(), call.id);
        assert!(call.to_native().get("thoughtSignature").is_none());
    }
}
