use async_trait::async_trait;
use gateway_types::ProxyError;
use serde_json::Value;

use crate::proxy::common::sanitize_upstream_error;
use crate::proxy::upstream::UpstreamClient;

/// Resolves which cloud project a credential is bound to.
#[async_trait]
pub trait ProjectResolver: Send + Sync {
    async fn resolve_project(&self, access_token: &str) -> Result<String, ProxyError>;
}

/// Uses the loadCodeAssist API to read `cloudaicompanionProject`.
#[async_trait]
impl ProjectResolver for UpstreamClient {
    async fn resolve_project(&self, access_token: &str) -> Result<String, ProxyError> {
        let request_body = serde_json::json!({
            "metadata": {
                "ideType": "IDE_UNSPECIFIED",
                "platform": "PLATFORM_UNSPECIFIED",
                "pluginType": "GEMINI"
            }
        });

        let response = self
            .call_v1_internal("loadCodeAssist", access_token, &request_body, None)
            .await
            .map_err(|e| ProxyError::Upstream { status: 502, message: e })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("loadCodeAssist returned {}: {}", status, body);
            return Err(ProxyError::Upstream {
                status,
                message: sanitize_upstream_error(status, &body),
            });
        }

        let data: Value = response.json().await.map_err(|e| ProxyError::Upstream {
            status: 502,
            message: format!("unreadable loadCodeAssist response: {}", e),
        })?;

        extract_project_id(&data).ok_or_else(|| ProxyError::Upstream {
            status: 403,
            message: "no cloud project associated with credential".to_string(),
        })
    }
}

/// `cloudaicompanionProject` is either a plain id or an object with an `id` field.
pub fn extract_project_id(data: &Value) -> Option<String> {
    let project = data.get("cloudaicompanionProject")?;
    project
        .as_str()
        .or_else(|| project.get("id").and_then(|v| v.as_str()))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_plain_project() {
        let data = json!({"cloudaicompanionProject": "proj-123"});
        assert_eq!(extract_project_id(&data).as_deref(), Some("proj-123"));
    }

    #[test]
    fn test_extract_object_project() {
        let data = json!({"cloudaicompanionProject": {"id": "proj-456", "name": "x"}});
        assert_eq!(extract_project_id(&data).as_deref(), Some("proj-456"));
    }

    #[test]
    fn test_missing_or_empty_project() {
        assert_eq!(extract_project_id(&json!({})), None);
        assert_eq!(extract_project_id(&json!({"cloudaicompanionProject": ""})), None);
    }
}
