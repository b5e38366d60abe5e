// Middleware module - Axum middleware

pub mod auth;
pub mod cors;

pub use auth::{admin_auth_middleware, auth_middleware, AccessKeys};
pub use cors::cors_layer;
