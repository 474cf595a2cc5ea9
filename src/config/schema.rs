//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::security::csp::CspConfig;

/// Root configuration for the middleware chain and its host server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Listener configuration (bind address, TLS, body limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Static security response headers.
    pub security_headers: SecurityHeadersConfig,

    /// Cross-origin resource sharing.
    pub cors: CorsConfig,

    /// Content-Security-Policy directives. Omitted directives are not emitted.
    pub csp: CspConfig,

    /// Signed cookie settings.
    pub cookies: CookieConfig,

    /// Response compression.
    pub compression: CompressionConfig,

    /// Static file mounts.
    pub static_mounts: Vec<FileServingConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Static security headers applied to every response.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityHeadersConfig {
    /// Enable security headers.
    pub enabled: bool,

    /// X-Frame-Options value.
    pub frame_options: String,

    /// Referrer-Policy value.
    pub referrer_policy: String,

    /// X-XSS-Protection value (legacy browsers).
    pub xss_protection: String,

    /// HSTS max-age in seconds. Zero disables the header.
    pub hsts_max_age_secs: u64,

    /// Append `includeSubDomains` to HSTS.
    pub hsts_include_subdomains: bool,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frame_options: "SAMEORIGIN".to_string(),
            referrer_policy: "strict-origin-when-cross-origin".to_string(),
            xss_protection: "1; mode=block".to_string(),
            hsts_max_age_secs: 31_536_000,
            hsts_include_subdomains: true,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS headers and preflight handling.
    pub enabled: bool,

    /// Allowed origins. `["*"]` allows any origin.
    pub allow_origins: Vec<String>,

    /// Allowed methods.
    pub allow_methods: Vec<String>,

    /// Allowed request headers.
    pub allow_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_origins: vec!["*".to_string()],
            allow_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allow_headers: ["Accept", "Content-Type", "Content-Length", "Authorization"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
        }
    }
}

/// Signed cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CookieConfig {
    /// Base64 (standard alphabet) HMAC key, at least 32 bytes once decoded.
    ///
    /// When absent a random key is generated at startup and cookies do not
    /// survive a restart.
    pub secret_key: Option<String>,
}

/// Response compression configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Enable gzip compression.
    pub enabled: bool,

    /// Minimum body size in bytes before compressing.
    pub min_size: u16,

    /// gzip level 0-9, or -1 for the codec default.
    pub level: i32,

    /// Compressible content types. Absent means the built-in list.
    pub content_types: Option<Vec<String>>,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_size: 1024,
            level: -1,
            content_types: None,
        }
    }
}

/// A static file mount.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileServingConfig {
    /// URL mount point (e.g., "/static").
    pub url_path: String,

    /// Filesystem root served under the mount.
    pub root: String,

    /// Optional directory inside `root` that requests are resolved against.
    #[serde(default)]
    pub prefix: Option<String>,

    /// Cache directive: > 0 public max-age, 0 no header, < 0 no-store.
    #[serde(default)]
    pub cache_max_age_secs: i64,
}
