//! edge-guard: security middleware for axum applications.
//!
//! Nonce-based Content-Security-Policy, HMAC-signed cookies, static security
//! headers and hardened static file serving, composed in front of
//! application handlers.

pub mod compression;
pub mod config;
pub mod cookies;
pub mod error;
pub mod fileserver;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GuardConfig;
pub use error::{GuardError, ResolveError, ServerError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
