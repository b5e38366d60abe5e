mod request_executor;

#[cfg(test)]
mod tests;

pub use request_executor::build_url;

use gateway_types::models::UpstreamConfig;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Thin client over the provider's `v1internal:{method}` endpoints.
pub struct UpstreamClient {
    http_client: Client,
    base_url: String,
    user_agent: String,
}

impl UpstreamClient {
    /// Accepts a pre-built `reqwest::Client` so callers control TLS and timeouts.
    pub fn new(http_client: Client, base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http_client, base_url, user_agent: user_agent.into() }
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self, String> {
        let http_client = build_http_client(config.request_timeout_secs)?;
        if url::Url::parse(&config.base_url).is_err() {
            return Err(format!("Invalid upstream base url: {}", config.base_url));
        }
        Ok(Self::new(http_client, config.base_url.clone(), config.user_agent.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub async fn call_v1_internal(
        &self,
        method: &str,
        access_token: &str,
        body: &Value,
        query_string: Option<&str>,
    ) -> Result<reqwest::Response, String> {
        let url = build_url(&self.base_url, method, query_string);
        let headers = request_executor::build_headers(access_token, &self.user_agent)?;
        request_executor::execute(&self.http_client, &url, headers, body).await
    }
}

/// Build HTTP client with the configured timeout.
pub fn build_http_client(timeout_secs: u64) -> Result<Client, String> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(5)))
        .tcp_nodelay(true)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))
}
