//! Anti-truncation: detect answers that stopped early and continue them.
//!
//! Continuations are ordinary upstream calls made through [`UpstreamCaller`],
//! so they go through credential acquisition and outcome reporting like the
//! first call. Output from every call is spliced before translation, and a
//! streamed answer keeps one outward stream.

pub mod continuation;
pub mod detection;
pub mod done_marker;
mod engine;
pub mod splice;
mod streaming;

#[cfg(test)]
mod tests;

pub use detection::{looks_structurally_closed, needs_continuation, TurnSummary};
pub use done_marker::{ensure_done_instruction, strip_done_marker, DoneMarkerFilter, DONE_MARKER};
pub use splice::{find_overlap, trim_overlap, HeadSplicer};

use async_trait::async_trait;
use futures::Stream;
use gateway_types::models::AntiTruncationConfig;
use gateway_types::ProxyError;
use serde_json::Value;
use std::pin::Pin;

/// Unwrapped native response chunks from one upstream stream.
pub type GeminiEventStream = Pin<Box<dyn Stream<Item = Result<Value, ProxyError>> + Send>>;

/// One complete upstream call, credential handling included.
#[async_trait]
pub trait UpstreamCaller: Send + Sync {
    async fn generate(&self, model: &str, request: &Value) -> Result<Value, ProxyError>;

    async fn stream_generate(&self, model: &str, request: &Value) -> Result<GeminiEventStream, ProxyError>;
}

#[derive(Debug, Clone)]
pub struct AntiTruncationEngine {
    config: AntiTruncationConfig,
}

impl AntiTruncationEngine {
    pub fn new(config: AntiTruncationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AntiTruncationConfig {
        &self.config
    }

    /// Done-marker variants always run; other models only with `always_on`.
    pub fn is_active(&self, done_mode: bool) -> bool {
        self.config.max_attempts > 0 && (done_mode || self.config.always_on)
    }

    /// Add the done-marker instruction when the engine will look for it.
    pub fn prepare_request(&self, request: &mut Value, done_mode: bool) {
        if done_mode && self.is_active(true) {
            ensure_done_instruction(request);
        }
    }
}
