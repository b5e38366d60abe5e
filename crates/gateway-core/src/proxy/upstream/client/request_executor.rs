use reqwest::{header, Client, Response};
use serde_json::Value;
use tokio::time::Duration;

/// Transport-level retries (connection reset, DNS hiccup) before giving up.
const MAX_TRANSPORT_RETRIES: u32 = 1;
const TRANSPORT_RETRY_DELAY_MS: u64 = 200;

pub fn build_url(base_url: &str, method: &str, query_string: Option<&str>) -> String {
    if let Some(qs) = query_string {
        format!("{}:{}?{}", base_url, method, qs)
    } else {
        format!("{}:{}", base_url, method)
    }
}

/// Headers for one upstream call; the credential is attached as an opaque bearer value.
pub fn build_headers(access_token: &str, user_agent: &str) -> Result<header::HeaderMap, String> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
    headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", access_token))
            .map_err(|e| e.to_string())?,
    );
    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(user_agent).map_err(|e| e.to_string())?,
    );
    Ok(headers)
}

/// POST `body` to `url`, retrying transport errors only. Any HTTP status is returned as-is.
pub async fn execute(
    client: &Client,
    url: &str,
    headers: header::HeaderMap,
    body: &Value,
) -> Result<Response, String> {
    let mut transport_retries: u32 = 0;
    loop {
        match client.post(url).headers(headers.clone()).json(body).send().await {
            Ok(resp) => {
                tracing::debug!("Upstream responded {} for {}", resp.status(), url);
                return Ok(resp);
            },
            Err(e) => {
                let msg = format!("HTTP request failed: {}", e);
                if transport_retries >= MAX_TRANSPORT_RETRIES {
                    tracing::error!("{}", msg);
                    return Err(msg);
                }
                transport_retries += 1;
                tracing::warn!(
                    "Transport error, retry {}/{} after {}ms: {}",
                    transport_retries,
                    MAX_TRANSPORT_RETRIES,
                    TRANSPORT_RETRY_DELAY_MS,
                    e
                );
                tokio::time::sleep(Duration::from_millis(TRANSPORT_RETRY_DELAY_MS)).await;
            },
        }
    }
}
