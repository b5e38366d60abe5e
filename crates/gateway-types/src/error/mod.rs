//! Typed error definitions for the gateway.
//!
//! - **`ProxyError`** covers everything a request can fail with and maps onto an HTTP status.
//! - **`ConfigError`** covers start-up configuration problems.

mod config;
mod proxy;

pub use config::ConfigError;
pub use proxy::ProxyError;
