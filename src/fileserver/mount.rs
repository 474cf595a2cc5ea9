//! Static file mounts.
//!
//! Each mount gets its own small router. A mount configured without a
//! trailing slash answers the bare path with a 301 to the slash form.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header::LOCATION, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::config::FileServingConfig;
use crate::error::ResolveError;
use crate::fileserver::cache::CachePolicy;
use crate::fileserver::resolver::SafeFileResolver;
use crate::http::error::SharedReporter;
use crate::observability::metrics;

#[derive(Clone)]
struct MountState {
    resolver: Arc<SafeFileResolver>,
    cache: CachePolicy,
    reporter: SharedReporter,
}

/// Build the router serving one static mount.
///
/// Mount paths are validated at config load; see
/// [`crate::config::validation`].
pub fn mount_router(config: &FileServingConfig, reporter: SharedReporter) -> Router {
    let state = MountState {
        resolver: Arc::new(SafeFileResolver::new(&config.root, config.prefix.as_deref())),
        cache: CachePolicy::from_max_age(config.cache_max_age_secs),
        reporter,
    };

    tracing::info!(
        mount = %config.url_path,
        root = %state.resolver.base().display(),
        cache = ?state.cache,
        "Static mount configured"
    );

    let base = config.url_path.trim_end_matches('/');
    let mut router = Router::new()
        .route(&format!("{base}/"), get(serve_mount_root))
        .route(&format!("{base}/{{*path}}"), get(serve_mount_path));

    if !base.is_empty() && !config.url_path.ends_with('/') {
        let target = format!("{base}/");
        router = router.route(base, get(move || redirect_to(target.clone())));
    }

    router.with_state(state)
}

async fn redirect_to(target: String) -> Response {
    match HeaderValue::from_str(&target) {
        Ok(location) => (StatusCode::MOVED_PERMANENTLY, [(LOCATION, location)]).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn serve_mount_root(State(state): State<MountState>, request: Request) -> Response {
    serve(&state, "", request).await
}

async fn serve_mount_path(
    State(state): State<MountState>,
    Path(path): Path<String>,
    request: Request,
) -> Response {
    serve(&state, &path, request).await
}

async fn serve(state: &MountState, path: &str, request: Request) -> Response {
    let file = match state.resolver.resolve(path).await {
        Ok(file) => file,
        Err(err) => {
            if let ResolveError::Io(source) = &err {
                tracing::error!(path = %path, error = %source, "Static file lookup failed");
            } else {
                tracing::debug!(path = %path, reason = %err, "Static file rejected");
            }
            let status = err.status();
            metrics::record_static_request(status.as_u16());
            return state.reporter.report(status);
        }
    };

    let mut response = match ServeFile::new(&file).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };

    let status = response.status();
    if status.is_success() || status == StatusCode::NOT_MODIFIED {
        state.cache.apply(response.headers_mut());
    }
    metrics::record_static_request(status.as_u16());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::error::JsonErrorReporter;
    use axum::http::header::CACHE_CONTROL;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("assets/img")).unwrap();
        fs::write(dir.path().join("assets/app.js"), "console.log(1)").unwrap();
        fs::write(dir.path().join("assets/img/a.svg"), "<svg/>").unwrap();
        dir
    }

    fn router(dir: &TempDir, url_path: &str, cache: i64) -> Router {
        let config = FileServingConfig {
            url_path: url_path.to_string(),
            root: dir.path().join("assets").display().to_string(),
            prefix: None,
            cache_max_age_secs: cache,
        };
        mount_router(&config, Arc::new(JsonErrorReporter))
    }

    async fn get_path(router: Router, uri: &str) -> Response {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_serves_file_with_cache_header() {
        let dir = fixture();
        let response = get_path(router(&dir, "/static", 3600), "/static/app.js").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_CONTROL], "public, max-age=3600");
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"console.log(1)");
    }

    #[tokio::test]
    async fn test_no_store_and_unset_policies() {
        let dir = fixture();
        let response = get_path(router(&dir, "/static", -1), "/static/app.js").await;
        assert_eq!(response.headers()[CACHE_CONTROL], "no-store");

        let response = get_path(router(&dir, "/static", 0), "/static/app.js").await;
        assert!(response.headers().get(CACHE_CONTROL).is_none());
    }

    #[tokio::test]
    async fn test_bare_mount_redirects() {
        let dir = fixture();
        let response = get_path(router(&dir, "/static", 0), "/static").await;

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[LOCATION], "/static/");
    }

    #[tokio::test]
    async fn test_directories_are_never_listed() {
        let dir = fixture();
        for uri in ["/static/", "/static/img", "/static/img/"] {
            let response = get_path(router(&dir, "/static", 0), uri).await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_escape_attempts_are_rejected() {
        let dir = fixture();
        for uri in [
            "/static/../../etc/passwd",
            "/static/%2e%2e/%2e%2e/etc/passwd",
            "/static/img/..%2f..%2f..%2fetc%2fpasswd",
        ] {
            let response = get_path(router(&dir, "/static", 0), uri).await;
            assert!(
                matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::FORBIDDEN),
                "{uri} -> {}",
                response.status()
            );
        }
    }

    #[tokio::test]
    async fn test_error_body_has_no_detail() {
        let dir = fixture();
        let response = get_path(router(&dir, "/static", 0), "/static/missing.css").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, serde_json::json!({"status": 404, "error": "Not Found"}));
    }

    #[tokio::test]
    async fn test_root_mount() {
        let dir = fixture();
        let response = get_path(router(&dir, "/", 0), "/app.js").await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = get_path(router(&dir, "/", 0), "/").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_trailing_slash_mount_has_no_redirect() {
        let dir = fixture();
        let response = get_path(router(&dir, "/files/", 0), "/files/app.js").await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = get_path(router(&dir, "/files/", 0), "/files").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
