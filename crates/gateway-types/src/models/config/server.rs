//! Listener and upstream connection settings.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct ServerConfig {
    /// Bind address
    #[validate(length(min = 1_u64))]
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[validate(range(min = 1_u16, max = 65535_u16))]
    #[serde(default = "default_port")]
    pub port: u16,
    /// API key required on proxy routes (None = open)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Key for the `/admin` routes (None = admin API disabled)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_key: Option<String>,
    /// Maximum request body size in megabytes
    #[validate(range(min = 1_usize, max = 1024_usize))]
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: None,
            admin_key: None,
            body_limit_mb: default_body_limit_mb(),
        }
    }
}

impl ServerConfig {
    /// Get the full bind socket address.
    pub fn get_socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Upstream provider connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct UpstreamConfig {
    /// Base URL of the v1internal endpoint (method is appended as `:{method}`)
    #[validate(url)]
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// User-Agent sent upstream
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds
    #[validate(range(min = 5_u64, max = 3600_u64))]
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

pub const fn default_port() -> u16 {
    8045
}

const fn default_body_limit_mb() -> usize {
    100
}

pub fn default_base_url() -> String {
    "https://cloudcode-pa.googleapis.com/v1internal".to_string()
}

fn default_user_agent() -> String {
    format!("gemini-gateway/{}", env!("CARGO_PKG_VERSION"))
}

pub const fn default_request_timeout() -> u64 {
    300
}
