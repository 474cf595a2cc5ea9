//! Error types shared across the guard subsystems.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors raised by the per-request security chain.
#[derive(Debug, Error)]
pub enum GuardError {
    /// The operating system entropy source could not fill the nonce buffer.
    #[error("secure random source unavailable: {0}")]
    Entropy(#[from] rand::Error),

    /// A handler asked for request security state that no middleware attached.
    #[error("request has no {0}; is the middleware installed?")]
    MissingContext(&'static str),
}

/// Outcome of a failed static file resolution.
///
/// Only the status code ever reaches the client.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("file not found")]
    NotFound,

    /// Directory, or an entry that resolves outside the mount root.
    #[error("access to path is forbidden")]
    Forbidden,

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResolveError {
    /// Coarse HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ResolveError::NotFound => StatusCode::NOT_FOUND,
            ResolveError::Forbidden => StatusCode::FORBIDDEN,
            ResolveError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors that stop the server from starting or keep running.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid listen address {0}")]
    Address(String),

    #[error("failed to load TLS material: {0}")]
    Tls(#[source] std::io::Error),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error(transparent)]
    Guard(#[from] GuardError),
}
