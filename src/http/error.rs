//! Error responses.
//!
//! The guard never decides what an error page looks like; it hands a status
//! to an [`ErrorReporter`] supplied by the host.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Host collaborator that renders mapped error statuses.
pub trait ErrorReporter: Send + Sync + 'static {
    fn report(&self, status: StatusCode) -> Response;
}

/// Shared handle to the configured reporter.
pub type SharedReporter = Arc<dyn ErrorReporter>;

#[derive(Serialize)]
struct ErrorBody {
    status: u16,
    error: &'static str,
}

/// Renders `{"status": 404, "error": "Not Found"}` and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonErrorReporter;

impl ErrorReporter for JsonErrorReporter {
    fn report(&self, status: StatusCode) -> Response {
        let body = ErrorBody {
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error"),
        };
        (status, Json(body)).into_response()
    }
}
