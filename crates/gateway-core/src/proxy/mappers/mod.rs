//! Protocol translation between the OpenAI chat format and the native
//! GenerateContent format.
//!
//! Both directions go through [`canonical`]: requests are lowered into
//! canonical messages and tool declarations once at the boundary, and
//! upstream candidates are lifted into canonical assistant messages before
//! they are rendered for the client.

pub mod accumulator;
pub mod canonical;
pub mod fake_stream;
pub mod gemini;
pub mod generation_config;
pub mod grounding;
pub mod model_features;
pub mod openai;
pub mod tool_schema;

pub use accumulator::{ChunkDelta, StreamChunkAccumulator};
pub use canonical::{
    CanonicalMessage, CanonicalPart, CanonicalRole, ToolCall, ToolDeclaration, ToolLinkage,
    ToolMode, ToolPolicy,
};
pub use model_features::{ModelFeatures, ThinkingMode};
