//! Common utilities shared by handlers, mappers and the dispatcher.

pub mod retry_after;
pub mod sanitize_error;
pub mod sse;

pub use retry_after::{parse_retry_after_header, parse_retry_time_from_body};
pub use sanitize_error::{sanitize_upstream_error, UpstreamErrorKind};
pub use sse::SseDataBuffer;
