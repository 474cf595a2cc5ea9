//! Static security headers and CORS.
//!
//! These are plain pass-through headers: values come straight from config and
//! are the same on every response. Headers a handler already set are left
//! alone.

use axum::{
    http::{
        header::{
            REFERRER_POLICY, STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
            X_XSS_PROTECTION,
        },
        HeaderName, HeaderValue, Method,
    },
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
};

use crate::config::{CorsConfig, SecurityHeadersConfig};

/// Build the static header set from configuration.
///
/// Values that are not valid header values are skipped with a warning;
/// config validation normally rejects them first.
pub fn security_header_values(config: &SecurityHeadersConfig) -> Vec<(HeaderName, HeaderValue)> {
    let mut headers = vec![(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"))];

    let configured = [
        (X_XSS_PROTECTION, config.xss_protection.clone()),
        (X_FRAME_OPTIONS, config.frame_options.clone()),
        (REFERRER_POLICY, config.referrer_policy.clone()),
    ];
    for (name, value) in configured {
        match HeaderValue::from_str(&value) {
            Ok(value) => headers.push((name, value)),
            Err(_) => tracing::warn!(header = %name, "Skipping invalid security header value"),
        }
    }

    // HSTS only makes sense over HTTPS, but browsers ignore it on plain HTTP
    if config.hsts_max_age_secs > 0 {
        let hsts = if config.hsts_include_subdomains {
            format!("max-age={}; includeSubDomains", config.hsts_max_age_secs)
        } else {
            format!("max-age={}", config.hsts_max_age_secs)
        };
        if let Ok(value) = HeaderValue::from_str(&hsts) {
            headers.push((STRICT_TRANSPORT_SECURITY, value));
        }
    }

    headers
}

/// Layer the static security headers onto every route of `router`.
pub fn apply_security_headers(mut router: Router, config: &SecurityHeadersConfig) -> Router {
    if !config.enabled {
        return router;
    }
    for (name, value) in security_header_values(config) {
        router = router.layer(SetResponseHeaderLayer::if_not_present(name, value));
    }
    router
}

/// Build the CORS layer, or `None` when CORS is disabled.
///
/// Preflight requests are answered by the layer and never reach a handler.
pub fn cors_layer(config: &CorsConfig) -> Option<CorsLayer> {
    if !config.enabled {
        return None;
    }

    let origin = if config.allow_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allow_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "Skipping invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    let methods: Vec<Method> = config
        .allow_methods
        .iter()
        .filter_map(|m| Method::from_bytes(m.as_bytes()).ok())
        .collect();

    let headers: Vec<HeaderName> = config
        .allow_headers
        .iter()
        .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok())
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers(headers),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode, routing::get};
    use tower::ServiceExt;

    fn lookup<'a>(headers: &'a [(HeaderName, HeaderValue)], name: &HeaderName) -> Option<&'a str> {
        headers
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.to_str().ok())
    }

    #[test]
    fn test_default_security_headers() {
        let headers = security_header_values(&SecurityHeadersConfig::default());

        assert_eq!(lookup(&headers, &X_CONTENT_TYPE_OPTIONS), Some("nosniff"));
        assert_eq!(lookup(&headers, &X_XSS_PROTECTION), Some("1; mode=block"));
        assert_eq!(lookup(&headers, &X_FRAME_OPTIONS), Some("SAMEORIGIN"));
        assert_eq!(
            lookup(&headers, &REFERRER_POLICY),
            Some("strict-origin-when-cross-origin")
        );
        assert_eq!(
            lookup(&headers, &STRICT_TRANSPORT_SECURITY),
            Some("max-age=31536000; includeSubDomains")
        );
    }

    #[test]
    fn test_hsts_disabled_with_zero_max_age() {
        let config = SecurityHeadersConfig {
            hsts_max_age_secs: 0,
            ..Default::default()
        };
        let headers = security_header_values(&config);
        assert!(lookup(&headers, &STRICT_TRANSPORT_SECURITY).is_none());
    }

    #[tokio::test]
    async fn test_handler_headers_win() {
        let router = Router::new().route(
            "/",
            get(|| async { ([(X_FRAME_OPTIONS, "DENY")], "framed") }),
        );
        let router = apply_security_headers(router, &SecurityHeadersConfig::default());

        let response = router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.headers()[X_FRAME_OPTIONS], "DENY");
        assert_eq!(response.headers()[X_CONTENT_TYPE_OPTIONS], "nosniff");
    }

    #[tokio::test]
    async fn test_preflight_short_circuits() {
        let layer = cors_layer(&CorsConfig::default()).unwrap();
        let router = Router::new()
            .route("/", get(|| async { "handler" }))
            .layer(layer);

        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/")
                    .header("Origin", "https://example.com")
                    .header("Access-Control-Request-Method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn test_cors_disabled() {
        let config = CorsConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(cors_layer(&config).is_none());
    }
}
