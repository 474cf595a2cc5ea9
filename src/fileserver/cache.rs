//! Cache-Control policy for served files.

use axum::http::{header::CACHE_CONTROL, HeaderMap, HeaderValue};

/// Caching directive for one mount, parsed from a signed max-age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// `public, max-age=N`
    Public(u64),
    /// No Cache-Control header at all.
    Unset,
    /// `no-store`
    NoStore,
}

impl CachePolicy {
    /// `> 0` caches publicly, `0` leaves the header off, `< 0` forbids storing.
    pub fn from_max_age(secs: i64) -> Self {
        match secs {
            0 => CachePolicy::Unset,
            n if n > 0 => CachePolicy::Public(n.unsigned_abs()),
            _ => CachePolicy::NoStore,
        }
    }

    pub fn header_value(&self) -> Option<HeaderValue> {
        match self {
            CachePolicy::Public(secs) => {
                HeaderValue::from_str(&format!("public, max-age={secs}")).ok()
            }
            CachePolicy::Unset => None,
            CachePolicy::NoStore => Some(HeaderValue::from_static("no-store")),
        }
    }

    /// Set the Cache-Control header for this policy, replacing any existing one.
    pub fn apply(&self, headers: &mut HeaderMap) {
        if let Some(value) = self.header_value() {
            headers.insert(CACHE_CONTROL, value);
        }
    }
}
