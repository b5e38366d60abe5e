//! Native-format helpers: v1internal wrapping and native request preparation.

pub mod request;
pub mod wrapper;

pub use request::prepare_native_request;
pub use wrapper::{unwrap_response, wrap_request};
