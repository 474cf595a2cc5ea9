//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;

use axum::{body::Body, http::Request, response::Response, Router};
use edge_guard::config::{FileServingConfig, GuardConfig};
use edge_guard::lifecycle::Shutdown;
use edge_guard::security::CspConfig;
use edge_guard::HttpServer;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tower::ServiceExt;

/// base64 of `0123456789abcdef0123456789abcdef`
pub const TEST_SECRET_KEY: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";

/// A static root with a large stylesheet, a nested directory and a file
/// outside the mount.
pub fn static_fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("public/fonts")).unwrap();
    fs::write(
        dir.path().join("public/site.css"),
        "body { margin: 0; }\n".repeat(200),
    )
    .unwrap();
    fs::write(dir.path().join("public/fonts/a.woff"), [0u8; 16]).unwrap();
    fs::write(dir.path().join("private.txt"), "do not serve").unwrap();
    dir
}

/// Config with a CSP, a fixed cookie key and `/static` mounted on `dir/public`.
pub fn guarded_config(dir: &TempDir) -> GuardConfig {
    let mut config = GuardConfig::default();
    config.csp = CspConfig {
        default_src: Some(vec!["'self'".to_string()]),
        ..Default::default()
    };
    config.cookies.secret_key = Some(TEST_SECRET_KEY.to_string());
    config.static_mounts.push(FileServingConfig {
        url_path: "/static".to_string(),
        root: dir.path().join("public").display().to_string(),
        prefix: None,
        cache_max_age_secs: 3600,
    });
    config
}

pub fn router(config: GuardConfig) -> Router {
    HttpServer::new(config).unwrap().router()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn get(router: &Router, uri: &str) -> Response {
    send(router, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Pull the nonce out of a `'nonce-...'` CSP token.
pub fn nonce_from_csp(csp: &str) -> &str {
    let start = csp.find("'nonce-").unwrap() + "'nonce-".len();
    let end = start + csp[start..].find('\'').unwrap();
    &csp[start..end]
}

/// Start the server on an ephemeral port.
pub async fn spawn_server(config: GuardConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let server = HttpServer::new(config).unwrap();
    let wait = shutdown.wait();
    tokio::spawn(async move {
        let _ = server.run(listener, wait).await;
    });

    (addr, shutdown)
}
