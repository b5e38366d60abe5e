//! Proxy module - the gateway request path and its background bookkeeping.
//!
//! - `credential_pool` / `persistence` / `storage`: credential rotation,
//!   health bookkeeping and its durable snapshots
//! - `mappers`: OpenAI ↔ native protocol translation
//! - `anti_truncation`: continuation of answers that stopped early
//! - `dispatcher`: per-request orchestration and 429 retry
//! - `handlers` / `middleware` / `server`: the Axum surface

pub mod anti_truncation;
pub mod common;
pub mod credential_pool;
pub mod dispatcher;
pub mod handlers;
pub mod mappers;
pub mod middleware;
pub mod persistence;
pub mod project_resolver;
pub mod server;
pub mod storage;
pub mod upstream;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use anti_truncation::AntiTruncationEngine;
pub use credential_pool::{CallOutcome, CredentialLease, CredentialPool, PoolStats};
pub use dispatcher::{DispatchOutput, InboundFormat, RequestDispatcher};
pub use persistence::{restore_pool, PersistenceWorker};
pub use server::{build_proxy_router, serve, AppState};
pub use storage::{create_storage, StorageAdapter};
pub use upstream::UpstreamClient;
