//! Function-name validation and JSON-schema cleaning for tool declarations.

use gateway_types::ProxyError;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::OnceLock;

static TOOL_NAME_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

/// Keys the provider's OpenAPI-subset schema rejects.
const UNSUPPORTED_SCHEMA_KEYS: &[&str] = &[
    "$schema",
    "$id",
    "$ref",
    "$defs",
    "definitions",
    "example",
    "examples",
    "readOnly",
    "writeOnly",
    "default",
    "title",
    "additionalProperties",
    "additionalItems",
    "exclusiveMaximum",
    "exclusiveMinimum",
    "oneOf",
    "anyOf",
    "allOf",
    "const",
    "contains",
    "patternProperties",
    "dependencies",
    "propertyNames",
    "if",
    "then",
    "else",
    "contentEncoding",
    "contentMediaType",
    "strict",
];

fn tool_name_regex() -> Option<&'static Regex> {
    TOOL_NAME_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]{0,63}$").ok())
        .as_ref()
}

/// Letter or underscore first, then up to 63 of `[A-Za-z0-9_.-]`.
pub fn validate_tool_name(name: &str) -> Result<(), ProxyError> {
    let valid = tool_name_regex().is_some_and(|re| re.is_match(name));
    if valid {
        Ok(())
    } else {
        tracing::warn!("Rejecting tool declaration with invalid name '{}'", name);
        Err(ProxyError::InvalidToolName { name: name.to_string() })
    }
}

/// Recursively drop unsupported keys. `format` survives only as `enum` or
/// `date-time`; an object with `properties` but no `type` gets `"object"`.
pub fn clean_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut cleaned = Map::new();
            for (key, value) in map {
                if UNSUPPORTED_SCHEMA_KEYS.contains(&key.as_str()) {
                    continue;
                }
                if key == "format" && !matches!(value.as_str(), Some("enum" | "date-time")) {
                    continue;
                }
                // Property names are user data, not schema keywords.
                if key == "properties" {
                    if let Value::Object(props) = value {
                        let props = props
                            .iter()
                            .map(|(name, sub)| (name.clone(), clean_schema(sub)))
                            .collect::<Map<_, _>>();
                        cleaned.insert(key.clone(), Value::Object(props));
                        continue;
                    }
                }
                cleaned.insert(key.clone(), clean_schema(value));
            }
            if cleaned.contains_key("properties") && !cleaned.contains_key("type") {
                cleaned.insert("type".to_string(), json!("object"));
            }
            Value::Object(cleaned)
        },
        Value::Array(items) => Value::Array(items.iter().map(clean_schema).collect()),
        other => other.clone(),
    }
}
