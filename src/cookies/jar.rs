//! Per-request cookie handle.
//!
//! [`cookie_middleware`] parses the request cookies once and stores a
//! [`Cookies`] handle in the request extensions. Handlers queue changes on the
//! handle; the middleware writes them as `Set-Cookie` headers after the
//! handler returns.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use cookie::Cookie;

use crate::cookies::manager::{append_set_cookie, request_cookies, CookieManager};
use crate::error::GuardError;
use crate::observability::metrics;

#[derive(Default)]
struct Pending {
    cookies: Vec<Cookie<'static>>,
    removed: HashSet<String>,
}

impl Pending {
    /// Queue `cookie`, replacing an earlier change to the same name.
    fn push(&mut self, cookie: Cookie<'static>) {
        self.cookies.retain(|c| c.name() != cookie.name());
        self.cookies.push(cookie);
    }
}

struct Inner {
    manager: Arc<CookieManager>,
    request: Vec<(String, String)>,
    pending: Mutex<Pending>,
}

/// Signed cookies of the current request.
///
/// Cheap to clone; clones share the pending changes.
#[derive(Clone)]
pub struct Cookies {
    inner: Arc<Inner>,
}

impl Cookies {
    pub fn new(manager: Arc<CookieManager>, headers: &HeaderMap) -> Self {
        Self {
            inner: Arc::new(Inner {
                manager,
                request: request_cookies(headers),
                pending: Mutex::new(Pending::default()),
            }),
        }
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, Pending> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a signed cookie for the response.
    pub fn set(&self, name: &str, value: &str, max_age_secs: i64) {
        let cookie = self.inner.manager.build_cookie(name, value, max_age_secs);
        let mut pending = self.pending();
        pending.removed.remove(name);
        pending.push(cookie);
    }

    /// Verified value of `name` as sent by the client, or `""`.
    ///
    /// A cookie deleted earlier in this request reads as `""`.
    pub fn get(&self, name: &str) -> String {
        if self.pending().removed.contains(name) {
            return String::new();
        }

        self.inner
            .request
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, raw)| self.inner.manager.decode_value(raw))
            .unwrap_or_default()
    }

    /// Queue removal of `name` on the client.
    pub fn delete(&self, name: &str) {
        let mut pending = self.pending();
        pending.removed.insert(name.to_string());
        pending.push(CookieManager::build_removal(name));
    }

    /// Read `name` and delete it in the same step.
    pub fn read_flash(&self, name: &str) -> String {
        let value = self.get(name);
        self.delete(name);
        metrics::record_flash_read();
        value
    }

    /// Write every queued change onto `headers`.
    pub fn apply(&self, headers: &mut HeaderMap) {
        let pending = std::mem::take(&mut *self.pending());
        for cookie in &pending.cookies {
            append_set_cookie(headers, cookie);
        }
    }
}

/// Attach a [`Cookies`] handle to the request and flush it onto the response.
pub async fn cookie_middleware(
    State(manager): State<Arc<CookieManager>>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookies = Cookies::new(manager, request.headers());
    request.extensions_mut().insert(cookies.clone());

    let mut response = next.run(request).await;
    cookies.apply(response.headers_mut());
    response
}

impl<S> FromRequestParts<S> for Cookies
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            let err = GuardError::MissingContext("cookie handle");
            tracing::error!(error = %err, "Cookie extractor used outside cookie middleware");
            StatusCode::INTERNAL_SERVER_ERROR
        })
    }
}
