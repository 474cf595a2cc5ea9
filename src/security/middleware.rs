//! CSP nonce middleware.
//!
//! Generates the request nonce, stores it in a [`SecurityContext`] for the
//! handler and writes the rendered Content-Security-Policy onto the response.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::CONTENT_SECURITY_POLICY, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::http::error::SharedReporter;
use crate::observability::metrics;
use crate::security::context::SecurityContext;
use crate::security::csp::{build_csp, CspConfig};
use crate::security::nonce::NonceGenerator;

/// State required by [`csp_nonce_middleware`].
#[derive(Clone)]
pub struct CspState<R = OsRng> {
    pub config: Arc<CspConfig>,
    pub generator: NonceGenerator<R>,
    pub reporter: SharedReporter,
}

impl CspState<OsRng> {
    pub fn new(config: CspConfig, reporter: SharedReporter) -> Self {
        Self {
            config: Arc::new(config),
            generator: NonceGenerator::new(),
            reporter,
        }
    }
}

pub async fn csp_nonce_middleware<R>(
    State(state): State<CspState<R>>,
    mut request: Request,
    next: Next,
) -> Response
where
    R: RngCore + CryptoRng + Clone + Send + Sync + 'static,
{
    let nonce = match state.generator.generate() {
        Ok(nonce) => nonce,
        Err(e) => {
            tracing::error!(error = %e, path = %request.uri().path(), "Nonce generation failed, aborting request");
            metrics::record_entropy_failure();
            return state.reporter.report(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    metrics::record_nonce_issued();

    let policy = build_csp(&state.config, &nonce);
    let header = if policy.is_empty() {
        None
    } else {
        match HeaderValue::from_str(&policy) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::error!("Rendered CSP is not a valid header value");
                return state.reporter.report(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    };

    request.extensions_mut().insert(SecurityContext::new(nonce));

    let mut response = next.run(request).await;
    if let Some(value) = header {
        response.headers_mut().insert(CONTENT_SECURITY_POLICY, value);
    }
    response
}
