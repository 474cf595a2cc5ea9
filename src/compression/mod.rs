//! Response compression settings.
//!
//! The gzip codec itself comes from `tower_http::compression`. This module
//! decides which responses are eligible: large enough and of a content type
//! on the allow-list.

use std::sync::Arc;

use axum::{
    http::{header::CONTENT_TYPE, Extensions, HeaderMap, StatusCode, Version},
    Router,
};
use tower_http::{
    compression::{
        predicate::{Predicate, SizeAbove},
        CompressionLayer,
    },
    CompressionLevel,
};

use crate::config::CompressionConfig;

/// Content types compressed when the config does not list its own.
pub const DEFAULT_COMPRESSIBLE_TYPES: &[&str] = &[
    "text/html",
    "text/richtext",
    "text/plain",
    "text/css",
    "text/x-script",
    "text/x-component",
    "text/x-java-source",
    "text/x-markdown",
    "text/event-stream",
    "application/javascript",
    "application/x-javascript",
    "text/javascript",
    "text/js",
    "image/x-icon",
    "image/vnd.microsoft.icon",
    "application/x-perl",
    "application/x-httpd-cgi",
    "text/xml",
    "application/xml",
    "application/rss+xml",
    "application/vnd.api+json",
    "application/json",
    "application/manifest+json",
    "application/ld+json",
    "application/graphql+json",
    "application/geo+json",
    "multipart/bag",
    "multipart/mixed",
    "application/xhtml+xml",
    "font/ttf",
    "font/otf",
    "font/x-woff",
    "image/svg+xml",
    "application/vnd.ms-fontobject",
    "application/ttf",
    "application/x-ttf",
    "application/otf",
    "application/x-otf",
    "application/truetype",
    "application/opentype",
    "application/x-opentype",
    "application/font-woff",
    "application/eot",
    "application/font",
    "application/font-sfnt",
    "application/wasm",
    "application/javascript-binast",
];

/// Immutable content-type allow-list.
///
/// Built once from config; entries are lowercased media types without
/// parameters.
#[derive(Debug, Clone)]
pub struct CompressibleTypes(Arc<[String]>);

impl CompressibleTypes {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let types: Vec<String> = types
            .into_iter()
            .map(|t| media_type(t.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();
        Self(types.into())
    }

    pub fn from_config(config: &CompressionConfig) -> Self {
        match &config.content_types {
            Some(types) => Self::new(types),
            None => Self::new(DEFAULT_COMPRESSIBLE_TYPES),
        }
    }

    pub fn contains(&self, content_type: &str) -> bool {
        let wanted = media_type(content_type);
        self.0.iter().any(|t| *t == wanted)
    }

    /// Whether the response headers carry an allow-listed Content-Type.
    pub fn matches(&self, headers: &HeaderMap) -> bool {
        headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| self.contains(ct))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `Text/HTML; charset=utf-8` → `text/html`
fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Map a configured level to a codec level.
///
/// `-1` is the codec default and `0..=9` are passed through. Anything else
/// logs a warning and falls back to the default.
pub fn parse_level(level: i32) -> CompressionLevel {
    match level {
        -1 => CompressionLevel::Default,
        0..=9 => CompressionLevel::Precise(level),
        other => {
            tracing::warn!(level = other, "Invalid compression level, using default");
            CompressionLevel::Default
        }
    }
}

/// Wrap `router` in gzip compression when enabled.
pub fn apply_compression(router: Router, config: &CompressionConfig) -> Router {
    if !config.enabled {
        return router;
    }

    let types = CompressibleTypes::from_config(config);
    tracing::debug!(
        min_size = config.min_size,
        content_types = types.len(),
        "Response compression enabled"
    );

    let allowed = move |_: StatusCode, _: Version, headers: &HeaderMap, _: &Extensions| {
        types.matches(headers)
    };
    let predicate = SizeAbove::new(config.min_size).and(allowed);

    router.layer(
        CompressionLayer::new()
            .quality(parse_level(config.level))
            .compress_when(predicate),
    )
}
