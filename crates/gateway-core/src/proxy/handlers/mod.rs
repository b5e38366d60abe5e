// Handlers module - API endpoint handlers

pub mod admin;
pub mod errors;
pub mod gemini;
pub mod health;
pub mod openai;
pub mod streaming;
