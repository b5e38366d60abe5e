//! Anti-truncation and persistence settings.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Anti-truncation engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct AntiTruncationConfig {
    /// Continuations allowed per request (0 disables the engine)
    #[validate(range(max = 20_u32))]
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Shortest overlap (chars) that is trimmed when splicing
    #[validate(range(min = 1_usize))]
    #[serde(default = "default_min_overlap")]
    pub min_overlap_chars: usize,
    /// Longest overlap window (chars) searched when splicing
    #[validate(range(min = 1_usize, max = 10000_usize))]
    #[serde(default = "default_max_overlap")]
    pub max_overlap_chars: usize,
    /// Run detection for every model, not only for anti-truncation marked ones
    #[serde(default = "default_always_on")]
    pub always_on: bool,
}

impl Default for AntiTruncationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            min_overlap_chars: default_min_overlap(),
            max_overlap_chars: default_max_overlap(),
            always_on: default_always_on(),
        }
    }
}

/// Storage backend behind the persistence worker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    JsonFile,
    Sqlite,
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::JsonFile => write!(f, "json_file"),
            StorageBackend::Sqlite => write!(f, "sqlite"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

impl StorageBackend {
    /// Parse from string.
    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "json_file" | "json" | "file" => Some(StorageBackend::JsonFile),
            "sqlite" => Some(StorageBackend::Sqlite),
            "memory" => Some(StorageBackend::Memory),
            _ => None,
        }
    }
}

/// Persistence worker settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// File or database path; defaults under the data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Timer tick of the flush loop
    #[validate(range(min = 1_u64, max = 3600_u64))]
    #[serde(default = "default_flush_interval")]
    pub flush_interval_secs: u64,
    /// Bound for the final flush on shutdown
    #[validate(range(min = 1_u64, max = 120_u64))]
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_secs: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: None,
            flush_interval_secs: default_flush_interval(),
            drain_timeout_secs: default_drain_timeout(),
        }
    }
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_min_overlap() -> usize {
    8
}

const fn default_max_overlap() -> usize {
    500
}

const fn default_always_on() -> bool {
    true
}

const fn default_flush_interval() -> u64 {
    5
}

const fn default_drain_timeout() -> u64 {
    5
}
