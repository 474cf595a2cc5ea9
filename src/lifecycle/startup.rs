//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn validated configuration into the long-lived subsystem values
//! - Bind the listener last, once everything else is ready

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::loader::decode_secret_key;
use crate::config::GuardConfig;
use crate::cookies::{CookieManager, SecretKey};
use crate::error::{GuardError, ServerError};

/// Resolve the cookie signing key.
///
/// Without a configured key a random one is generated. Cookies signed with it
/// stop verifying when the process restarts.
pub fn resolve_secret_key(config: &GuardConfig) -> Result<SecretKey, GuardError> {
    match decode_secret_key(config) {
        Some(bytes) => Ok(SecretKey::new(bytes)),
        None => {
            tracing::warn!(
                "No cookie secret_key configured, using an ephemeral key; \
                 signed cookies will not survive a restart"
            );
            SecretKey::generate()
        }
    }
}

pub fn build_cookie_manager(config: &GuardConfig) -> Result<CookieManager, GuardError> {
    Ok(CookieManager::new(resolve_secret_key(config)?))
}

/// Parse the configured bind address.
pub fn bind_address(config: &GuardConfig) -> Result<SocketAddr, ServerError> {
    config
        .listener
        .bind_address
        .parse()
        .map_err(|_| ServerError::Address(config.listener.bind_address.clone()))
}

/// Bind the plain HTTP listener.
pub async fn bind_listener(config: &GuardConfig) -> Result<TcpListener, ServerError> {
    let address = bind_address(config)?;
    TcpListener::bind(address)
        .await
        .map_err(|source| ServerError::Bind {
            address: address.to_string(),
            source,
        })
}
