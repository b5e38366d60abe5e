//! # Gateway Core
//!
//! Core logic of the Gemini gateway.
//!
//! ## Architecture
//!
//! ```text
//! gateway-core/src/proxy/
//! ├── credential_pool/  # Round-robin selection, cooldowns, auto-ban
//! ├── persistence.rs    # Background flush of pool state
//! ├── storage/          # JSON file / SQLite / memory backends
//! ├── mappers/          # OpenAI <-> native translation
//! ├── anti_truncation/  # Continuation of early-stopped answers
//! ├── dispatcher/       # Per-request orchestration and 429 retry
//! ├── handlers/         # Axum endpoint handlers
//! └── server.rs         # Router assembly
//! ```

#![allow(
    clippy::too_many_arguments,
    reason = "Request builders take the full set of protocol knobs"
)]
#![allow(
    clippy::significant_drop_tightening,
    reason = "Pool state guards span the whole mutation section"
)]
#![allow(
    clippy::wildcard_enum_match_arm,
    reason = "Protocol enums gain variants upstream; wildcards keep mapping forward compatible"
)]
#![allow(
    clippy::redundant_else,
    reason = "Explicit else blocks improve readability in complex control flow"
)]
#![allow(clippy::map_err_ignore, reason = "Error context is provided in the replacement message")]
#![allow(clippy::implicit_clone, reason = "Explicit .clone() vs .to_string() is stylistic")]
#![allow(
    clippy::redundant_type_annotations,
    reason = "Explicit types improve code clarity in complex async contexts"
)]
#![allow(clippy::needless_continue, reason = "Explicit continue improves loop readability")]
#![allow(
    clippy::branches_sharing_code,
    reason = "Separate branches improve readability even with shared code"
)]
#![allow(
    clippy::derive_partial_eq_without_eq,
    reason = "Some types intentionally don't implement Eq"
)]
// Test-only lints: allow panic!, println!, etc. in test code
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::float_cmp,
        clippy::unnecessary_join,
        clippy::needless_collect,
        clippy::assertions_on_result_states
    )
)]

pub mod config;
pub mod error;
pub mod proxy;
pub mod utils;

// Re-export commonly used types
pub use error::{AppError, AppResult};
pub use proxy::{CredentialPool, PersistenceWorker, RequestDispatcher};
