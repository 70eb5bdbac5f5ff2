//! HTTP surface for the gateway.
//!
//! ```text
//! POST /      {action, payload} ──► Gateway::dispatch ──► {result} | {error}
//! POST /ai    (alias)
//! OPTIONS *   CORS preflight, answered by the CORS layer
//! GET /health liveness
//! ```
//!
//! Quota state rides on `X-RateLimit-Limit` / `X-RateLimit-Remaining`, plus
//! `Retry-After` on 429 responses. Error bodies carry only the translated
//! user message from [`GatewayError::user_message`].

pub mod config;
mod cors;

pub use cors::cors_layer;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, FailedToBufferBody};
use axum::extract::{ConnectInfo, DefaultBodyLimit, FromRequest, Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::limiter::RateDecision;
use crate::types::{ClientIdentity, RawActionRequest};
use crate::{Gateway, GatewayError, GatewayReply};

/// Response header names.
pub mod headers {
    pub const X_RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
    pub const X_RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
    pub const RETRY_AFTER: &str = "retry-after";
}

/// Caller identity established by an authentication layer in front of
/// the router. Insert it as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

#[derive(Clone)]
enum GatewayState {
    Ready(Arc<Gateway>),
    /// Startup could not build a gateway; every request gets a fixed
    /// configuration error and no model is called.
    Misconfigured(String),
}

/// Shared router state.
#[derive(Clone)]
pub struct AppState {
    gateway: GatewayState,
    max_body_bytes: usize,
}

const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

impl AppState {
    pub fn ready(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway: GatewayState::Ready(gateway),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn misconfigured(reason: impl Into<String>) -> Self {
        Self {
            gateway: GatewayState::Misconfigured(reason.into()),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn max_body_bytes(mut self, n: usize) -> Self {
        self.max_body_bytes = n;
        self
    }
}

/// Build the HTTP router.
pub fn router(state: AppState, allowed_origin: Option<&str>) -> Router {
    Router::new()
        .route("/", post(handle_action))
        .route("/ai", post(handle_action))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(cors_layer(allowed_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": crate::PKG_VERSION }))
}

async fn handle_action(State(state): State<AppState>, request: Request) -> Response {
    let gateway = match &state.gateway {
        GatewayState::Ready(gateway) => Arc::clone(gateway),
        GatewayState::Misconfigured(reason) => {
            warn!(reason = %reason, "request refused: gateway not configured");
            return error_response(&GatewayError::Configuration(reason.clone()), None);
        }
    };

    let client = client_identity(&request);
    let body = match Bytes::from_request(request, &state).await {
        Ok(body) => body,
        Err(BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_))) => {
            warn!(client = %client, limit = state.max_body_bytes, "request body exceeded limit");
            let err = GatewayError::PayloadTooLarge {
                limit: state.max_body_bytes,
            };
            return error_response(&err, None);
        }
        Err(rejection) => {
            warn!(client = %client, error = %rejection, "failed to read request body");
            let err = GatewayError::Validation("request body could not be read".into());
            return error_response(&err, None);
        }
    };
    let raw: RawActionRequest = match serde_json::from_slice(&body) {
        Ok(raw) => raw,
        Err(e) => return error_response(&GatewayError::Json(e), None),
    };

    reply_response(gateway.dispatch(raw, client).await)
}

/// Resolve the rate-limit identity: authenticated user, then forwarded
/// client address, then socket peer.
pub fn client_identity(request: &Request) -> ClientIdentity {
    if let Some(AuthenticatedUser(id)) = request.extensions().get::<AuthenticatedUser>()
        && !id.is_empty()
    {
        return ClientIdentity::user(id);
    }

    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    if let Some(addr) = header("x-forwarded-for").or_else(|| header("x-real-ip")) {
        return ClientIdentity::address(addr);
    }

    if let Some(ConnectInfo(peer)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return ClientIdentity::address(peer.ip().to_string());
    }

    ClientIdentity::anonymous()
}

fn reply_response(reply: GatewayReply) -> Response {
    match reply.outcome {
        Ok(result) => {
            let mut response = (StatusCode::OK, Json(json!({ "result": result }))).into_response();
            if let Some(quota) = reply.quota {
                apply_quota_headers(&mut response, quota);
            }
            response
        }
        Err(e) => error_response(&e, reply.quota),
    }
}

fn error_response(err: &GatewayError, quota: Option<RateDecision>) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Json(json!({ "error": err.user_message() }))).into_response();
    if let Some(quota) = quota {
        apply_quota_headers(&mut response, quota);
    }
    if let Some(wait) = err.retry_after() {
        response
            .headers_mut()
            .insert(headers::RETRY_AFTER, HeaderValue::from(retry_after_secs(wait)));
    }
    response
}

fn apply_quota_headers(response: &mut Response, quota: RateDecision) {
    let map = response.headers_mut();
    map.insert(headers::X_RATE_LIMIT_LIMIT, HeaderValue::from(quota.limit));
    map.insert(
        headers::X_RATE_LIMIT_REMAINING,
        HeaderValue::from(quota.remaining),
    );
}

/// Whole seconds, rounded up, never zero.
fn retry_after_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}
