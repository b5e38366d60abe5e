//! Protocol definitions for the two client-facing wire formats.
//!
//! - OpenAI (ChatCompletions API)
//! - Google Gemini (GenerateContent API)
//!
//! Only the enums and counters shared across the translator live here; the
//! request/response bodies are modelled next to the mappers that use them.

pub mod gemini;
pub mod openai;

pub use gemini::{map_finish_reason, GeminiRole, GeminiUsageMetadata};
pub use openai::{FinishReason, OpenAIRole, OpenAIUsage};
