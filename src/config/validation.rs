//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics. All violations are
//! collected so an operator sees every problem in one run.

use std::collections::HashSet;
use std::path::{Component, Path};

use axum::http::HeaderValue;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use crate::config::schema::{FileServingConfig, GuardConfig};
use crate::cookies::MIN_SECRET_KEY_LEN;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("static mount `{0}` must start with '/'")]
    MountNotAbsolute(String),

    #[error("static mount `{0}` must not contain URL parameters ('{{', '}}', '*')")]
    MountHasParameters(String),

    #[error("static mount `{0}` is configured more than once")]
    DuplicateMount(String),

    #[error("static mount `{mount}` has an empty root")]
    EmptyRoot { mount: String },

    #[error("static mount `{mount}` prefix `{prefix}` must be a relative path without '..'")]
    UnsafePrefix { mount: String, prefix: String },

    #[error("csp directive {directive} has invalid source token `{token}`")]
    InvalidCspToken { directive: &'static str, token: String },

    #[error("cookie secret_key is not valid base64")]
    SecretKeyEncoding,

    #[error("cookie secret_key must be at least {min} bytes, got {actual}")]
    SecretKeyTooShort { min: usize, actual: usize },

    #[error("security header {name} has an invalid value")]
    InvalidHeaderValue { name: &'static str },

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let mut seen = HashSet::new();
    for mount in &config.static_mounts {
        validate_mount(mount, &mut errors);
        if !seen.insert(mount.url_path.trim_end_matches('/').to_string()) {
            errors.push(ValidationError::DuplicateMount(mount.url_path.clone()));
        }
    }

    for (directive, _, sources) in config.csp.directives() {
        for token in sources.unwrap_or_default() {
            if !is_valid_csp_token(token) {
                errors.push(ValidationError::InvalidCspToken {
                    directive,
                    token: token.clone(),
                });
            }
        }
    }

    if let Some(encoded) = &config.cookies.secret_key {
        match STANDARD.decode(encoded.trim()) {
            Ok(key) if key.len() < MIN_SECRET_KEY_LEN => {
                errors.push(ValidationError::SecretKeyTooShort {
                    min: MIN_SECRET_KEY_LEN,
                    actual: key.len(),
                });
            }
            Ok(_) => {}
            Err(_) => errors.push(ValidationError::SecretKeyEncoding),
        }
    }

    let headers = &config.security_headers;
    if headers.enabled {
        for (name, value) in [
            ("X-Frame-Options", &headers.frame_options),
            ("Referrer-Policy", &headers.referrer_policy),
            ("X-XSS-Protection", &headers.xss_protection),
        ] {
            if HeaderValue::from_str(value).is_err() {
                errors.push(ValidationError::InvalidHeaderValue { name });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_mount(mount: &FileServingConfig, errors: &mut Vec<ValidationError>) {
    if !mount.url_path.starts_with('/') {
        errors.push(ValidationError::MountNotAbsolute(mount.url_path.clone()));
    }
    if mount.url_path.contains(['{', '}', '*']) {
        errors.push(ValidationError::MountHasParameters(mount.url_path.clone()));
    }
    if mount.root.trim().is_empty() {
        errors.push(ValidationError::EmptyRoot {
            mount: mount.url_path.clone(),
        });
    }
    if let Some(prefix) = &mount.prefix {
        if !is_interior_prefix(prefix) {
            errors.push(ValidationError::UnsafePrefix {
                mount: mount.url_path.clone(),
                prefix: prefix.clone(),
            });
        }
    }
}

/// A prefix may only descend into the root.
///
/// A leading '/' is tolerated and treated as relative to the root.
fn is_interior_prefix(prefix: &str) -> bool {
    Path::new(prefix.trim_start_matches('/'))
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn is_valid_csp_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_graphic() && b != b';' && b != b',')
}
