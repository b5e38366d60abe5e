//! # Gateway Types
//!
//! Core types, models, and error definitions for the Gemini gateway.
//!
//! - **`error`** - Request-path error taxonomy and configuration errors
//! - **`models`** - Credential records and gateway configuration
//! - **`protocol`** - Small OpenAI/Gemini protocol enums shared by the translator
//!
//! ## Architecture Role
//!
//! `gateway-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!        gateway-types (this crate)
//!                │
//!                ▼
//!          gateway-core
//!                │
//!                ▼
//!         gateway-server
//! ```

pub mod error;
pub mod models;
pub mod protocol;

pub use error::{ConfigError, ProxyError};

pub use models::{CredentialRecord, CredentialSnapshot, CredentialSummary, GatewayConfig};
