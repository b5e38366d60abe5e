//! Credential pool and retry policy settings.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Credential pool behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct PoolConfig {
    /// Successful calls served by one credential before the pointer advances
    #[validate(range(min = 1_u32))]
    #[serde(default = "default_calls_per_rotation")]
    pub calls_per_rotation: u32,
    /// Cooldown applied on 429 when upstream gives no reset hint
    #[serde(default = "default_cooldown_secs")]
    pub default_cooldown_secs: u64,
    /// Automatic disabling on specific error codes
    #[serde(default)]
    #[validate(nested)]
    pub auto_ban: AutoBanConfig,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            calls_per_rotation: default_calls_per_rotation(),
            default_cooldown_secs: default_cooldown_secs(),
            auto_ban: AutoBanConfig::default(),
        }
    }
}

/// Auto-ban policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct AutoBanConfig {
    #[serde(default)]
    pub enabled: bool,
    /// HTTP codes that count toward a ban
    #[serde(default = "default_ban_codes")]
    pub codes: Vec<u16>,
    /// Occurrences of a ban code in the recent error history needed to ban
    #[validate(range(min = 1_u32, max = 10_u32))]
    #[serde(default = "default_ban_threshold")]
    pub threshold: u32,
}

impl Default for AutoBanConfig {
    fn default() -> Self {
        Self { enabled: false, codes: default_ban_codes(), threshold: default_ban_threshold() }
    }
}

impl AutoBanConfig {
    pub fn is_ban_code(&self, code: u16) -> bool {
        self.enabled && self.codes.contains(&code)
    }
}

/// Retry policy for upstream 429 responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct RetryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Extra attempts after the first one
    #[validate(range(max = 64_u32))]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Sleep between attempts
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: default_max_retries(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl RetryConfig {
    /// Total upstream attempts for one logical request.
    pub fn total_attempts(&self) -> u32 {
        if self.enabled {
            self.max_retries.saturating_add(1)
        } else {
            1
        }
    }
}

const fn default_calls_per_rotation() -> u32 {
    10
}

const fn default_cooldown_secs() -> u64 {
    60
}

fn default_ban_codes() -> Vec<u16> {
    vec![403]
}

const fn default_ban_threshold() -> u32 {
    1
}

const fn default_true() -> bool {
    true
}

const fn default_max_retries() -> u32 {
    5
}

const fn default_interval_ms() -> u64 {
    100
}
