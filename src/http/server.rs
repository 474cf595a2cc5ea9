//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Put the CSP nonce and cookie middleware in front of application routes
//! - Merge static file mounts beside the application
//! - Wire up cross-cutting layers (headers, CORS, compression, limits,
//!   request ID, tracing)
//! - Serve over plain TCP or TLS with graceful shutdown
//!
//! # Layer Order (outermost first)
//! ```text
//! request id → trace → propagate id → timeout → body limit → CORS
//!     → security headers → compression
//!     → app routes:    CSP nonce → cookies → handler
//!     → static mounts: SafeFileResolver
//! ```

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use axum_server::tls_rustls::RustlsConfig;
use rand::rngs::OsRng;
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::compression::apply_compression;
use crate::config::{GuardConfig, TlsConfig};
use crate::cookies::{cookie_middleware, CookieManager};
use crate::error::ServerError;
use crate::fileserver::mount_router;
use crate::http::error::{JsonErrorReporter, SharedReporter};
use crate::http::handlers::demo_routes;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::startup::{bind_address, build_cookie_manager};
use crate::security::headers::{apply_security_headers, cors_layer};
use crate::security::{csp_nonce_middleware, CspState};

/// Time in-flight TLS connections get to finish after shutdown is requested.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP server for the guarded application.
pub struct HttpServer {
    router: Router,
    config: GuardConfig,
}

impl HttpServer {
    /// Serve the built-in demo routes.
    pub fn new(config: GuardConfig) -> Result<Self, ServerError> {
        Self::with_app(config, demo_routes())
    }

    /// Guard `app` with the configured middleware chain.
    pub fn with_app(config: GuardConfig, app: Router) -> Result<Self, ServerError> {
        Self::with_reporter(config, app, Arc::new(JsonErrorReporter))
    }

    /// Like [`HttpServer::with_app`], rendering error statuses with `reporter`.
    pub fn with_reporter(
        config: GuardConfig,
        app: Router,
        reporter: SharedReporter,
    ) -> Result<Self, ServerError> {
        let cookies = Arc::new(build_cookie_manager(&config)?);
        let router = Self::build_router(&config, app, cookies, reporter);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &GuardConfig,
        app: Router,
        cookies: Arc<CookieManager>,
        reporter: SharedReporter,
    ) -> Router {
        let csp = CspState::new(config.csp.clone(), reporter.clone());

        // Later layers run first: nonce, then cookies, then the handler
        let mut router = app
            .layer(middleware::from_fn_with_state(cookies, cookie_middleware))
            .layer(middleware::from_fn_with_state(
                csp,
                csp_nonce_middleware::<OsRng>,
            ));

        for mount in &config.static_mounts {
            let mount_routes = mount_router(mount, reporter.clone());
            if mount.url_path == "/" {
                // A root mount would claim `GET /`; it only serves what the app does not route
                router = router.fallback_service(mount_routes);
            } else {
                router = router.merge(mount_routes);
            }
        }

        router = apply_compression(router, &config.compression);
        router = apply_security_headers(router, &config.security_headers);
        if let Some(cors) = cors_layer(&config.cors) {
            router = router.layer(cors);
        }

        router
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The composed router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Serve plain HTTP on `listener` until `shutdown` completes.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            static_mounts = self.config.static_mounts.len(),
            csp = !self.config.csp.is_empty(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on the configured bind address until `shutdown` completes.
    pub async fn run_tls<F>(self, tls: &TlsConfig, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = bind_address(&self.config)?;
        let rustls = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path))
            .await
            .map_err(ServerError::Tls)?;

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            shutdown.await;
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        tracing::info!(address = %addr, "HTTPS server starting");
        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Load TLS configuration from certificate and key files.
async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, std::io::Error> {
    for (what, path) in [("Certificate", cert_path), ("Private key", key_path)] {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{what} file not found: {}", path.display()),
            ));
        }
    }
    RustlsConfig::from_pem_file(cert_path, key_path).await
}
