//! Signed cookies.
//!
//! # Data Flow
//! ```text
//! Request ──► cookie_middleware ──► Cookies (extension) ──► handler
//!                                        │ set / delete queued
//! Response ◄── Set-Cookie ◄──────────────┘
//! ```
//!
//! [`CookieManager`] holds the one secret key and does the signing;
//! [`Cookies`] is the per-request view handlers work with.

pub mod jar;
pub mod manager;
pub mod signer;

pub use jar::{cookie_middleware, Cookies};
pub use manager::CookieManager;
pub use signer::{CookieSigner, SecretKey};

/// Shortest configured secret key accepted.
pub const MIN_SECRET_KEY_LEN: usize = 32;
