//! Request-scoped security state.
//!
//! The nonce middleware stores a [`SecurityContext`] in the request
//! extensions exactly once per request. Handlers read it back through the
//! extractor, which is how the `<script nonce>` they render and the CSP header
//! stay in agreement.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::Extensions;

use crate::error::GuardError;
use crate::security::nonce::Nonce;

/// Security state attached to one request.
#[derive(Debug, Clone)]
pub struct SecurityContext {
    nonce: Nonce,
}

impl SecurityContext {
    pub(crate) fn new(nonce: Nonce) -> Self {
        Self { nonce }
    }

    /// The nonce that the CSP header of this response carries.
    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    /// Look up the context without panicking.
    pub fn from_extensions(extensions: &Extensions) -> Result<&Self, GuardError> {
        extensions
            .get::<Self>()
            .ok_or(GuardError::MissingContext("CSP nonce"))
    }
}

/// Fetch the request nonce.
///
/// # Panics
///
/// Panics if the request did not pass through the CSP nonce middleware. That
/// is a wiring bug: serving the page anyway would render script tags that the
/// policy silently blocks.
pub fn get_nonce(extensions: &Extensions) -> &Nonce {
    match SecurityContext::from_extensions(extensions) {
        Ok(ctx) => ctx.nonce(),
        Err(err) => panic!("{err}"),
    }
}

impl<S> FromRequestParts<S> for SecurityContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::new(get_nonce(&parts.extensions).clone()))
    }
}
