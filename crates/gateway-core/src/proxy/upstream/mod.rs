//! Upstream module - client for the provider's v1internal endpoint

pub mod client;

pub use client::UpstreamClient;
