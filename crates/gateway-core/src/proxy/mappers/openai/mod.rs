//! OpenAI ChatCompletions ↔ native translation.

pub mod models;
pub mod request;
pub mod response;
pub mod streaming;

pub use models::*;
pub use request::build_gemini_request;
pub use response::{build_chat_completion, new_completion_id};
pub use streaming::StreamTranslator;
