//! CORS layer for browser clients.

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Build the CORS layer from the configured origin setting.
///
/// `None`, empty, or `*` allows any origin. Otherwise the value is a
/// comma-separated list of exact origins.
///
/// ```bash
/// # Allow specific origins (production)
/// export ALLOWED_ORIGIN="https://app.example.com,https://admin.example.com"
/// ```
pub fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allow_origin(allowed_origin))
        .allow_headers([
            HeaderName::from_static("authorization"),
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            HeaderName::from_static("content-type"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .expose_headers([
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderName::from_static("x-ratelimit-remaining"),
            HeaderName::from_static("retry-after"),
        ])
}

fn allow_origin(allowed_origin: Option<&str>) -> AllowOrigin {
    let configured = allowed_origin.map(str::trim).unwrap_or_default();
    if configured.is_empty() || configured == "*" {
        return AllowOrigin::any();
    }

    let origins: Vec<HeaderValue> = configured
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect();

    if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    }
}
