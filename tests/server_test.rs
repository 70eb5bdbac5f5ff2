//! HTTP surface tests driven through the router with `oneshot`.

#![cfg(feature = "server")]

mod common;

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{LITE, LOGIC, RecordingStore, ScriptedClient, quota_exceeded, test_tiers};
use nutrigate::server::{AppState, AuthenticatedUser, router};
use nutrigate::types::Action;
use nutrigate::{Gateway, RateLimitConfig};

// ============================================================================
// Helpers
// ============================================================================

fn app(client: ScriptedClient, limits: RateLimitConfig) -> axum::Router {
    let gateway = Gateway::builder()
        .model_client(Arc::new(client))
        .tiers(test_tiers())
        .cache_store(Arc::new(RecordingStore::new()))
        .rate_limits(limits)
        .build()
        .unwrap();
    router(AppState::ready(Arc::new(gateway)), None)
}

fn post(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.5")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn chat_success_carries_quota_headers() {
    let app = app(
        ScriptedClient::new().always(LITE, "Drink water with meals."),
        RateLimitConfig::new().limit(Action::Chat, 5),
    );

    let response = app
        .oneshot(post(json!({ "action": "chat", "payload": { "message": "tips?" } })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-ratelimit-limit"], "5");
    assert_eq!(response.headers()["x-ratelimit-remaining"], "4");
    assert_eq!(
        json_body(response).await,
        json!({ "result": "Drink water with meals." })
    );
}

#[tokio::test]
async fn ai_alias_route_dispatches() {
    let app = app(ScriptedClient::new().always(LITE, "hi"), RateLimitConfig::new());
    let request = Request::builder()
        .method("POST")
        .uri("/ai")
        .body(Body::from(
            json!({ "action": "chat", "payload": { "message": "hello" } }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn structured_result_is_json_text() {
    let app = app(
        ScriptedClient::new().always(LOGIC, r#"{"totals":{"calories":95}}"#),
        RateLimitConfig::new(),
    );
    let response = app
        .oneshot(post(json!({
            "action": "calculate-nutrition",
            "payload": { "description": "one apple" }
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let result: Value = serde_json::from_str(body["result"].as_str().unwrap()).unwrap();
    assert_eq!(result["totals"]["calories"], 95);
}

#[tokio::test]
async fn unknown_action_is_bad_request() {
    let app = app(ScriptedClient::new(), RateLimitConfig::new());
    let response = app
        .oneshot(post(json!({ "action": "delete-account", "payload": {} })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get("x-ratelimit-limit").is_none());

    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("unknown action"));
}

#[tokio::test]
async fn missing_action_is_bad_request() {
    let app = app(ScriptedClient::new(), RateLimitConfig::new());
    let response = app.oneshot(post(json!({ "payload": {} }))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_json_is_bad_request() {
    let app = app(ScriptedClient::new(), RateLimitConfig::new());
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_body_is_payload_too_large() {
    let gateway = Gateway::builder()
        .model_client(Arc::new(ScriptedClient::new()))
        .tiers(test_tiers())
        .build()
        .unwrap();
    let app = router(
        AppState::ready(Arc::new(gateway)).max_body_bytes(1024),
        None,
    );

    let photo = "A".repeat(4096);
    let response = app
        .oneshot(post(json!({ "action": "analyze-food", "payload": { "image": photo } })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(response.headers().get("x-ratelimit-limit").is_none());

    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("too large"));
}

#[tokio::test]
async fn rate_limited_request_gets_429_and_retry_after() {
    let app = app(
        ScriptedClient::new().always(LITE, "ok"),
        RateLimitConfig::new().limit(Action::Chat, 1),
    );
    let body = json!({ "action": "chat", "payload": { "message": "hi" } });

    let first = app.clone().oneshot(post(body.clone())).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(post(body)).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(second.headers()["x-ratelimit-remaining"], "0");
    let retry_after: u64 = second.headers()["retry-after"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=3600).contains(&retry_after));

    let body = json_body(second).await;
    assert!(body["error"].as_str().unwrap().contains("request limit"));
}

#[tokio::test]
async fn authenticated_user_has_own_quota() {
    let app = app(
        ScriptedClient::new().always(LITE, "ok"),
        RateLimitConfig::new().limit(Action::Chat, 1),
    );
    let body = json!({ "action": "chat", "payload": { "message": "hi" } });

    let first = app.clone().oneshot(post(body.clone())).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    // Same forwarded address, but now identified as a user
    let mut request = post(body);
    request
        .extensions_mut()
        .insert(AuthenticatedUser("u-7".to_string()));
    let second = app.oneshot(request).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
}

#[tokio::test]
async fn upstream_failure_hides_provider_text() {
    let app = app(
        ScriptedClient::new().then(LITE, Err(quota_exceeded())),
        RateLimitConfig::new(),
    );
    let response = app
        .oneshot(post(json!({ "action": "chat", "payload": { "message": "hi" } })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = json_body(response).await;
    let message = body["error"].as_str().unwrap();
    assert!(!message.contains("RESOURCE_EXHAUSTED"));
}

#[tokio::test]
async fn misconfigured_gateway_refuses_every_request() {
    let app = router(AppState::misconfigured("GEMINI_API_KEY is not set"), None);
    let response = app
        .oneshot(post(json!({ "action": "chat", "payload": { "message": "hi" } })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("not configured"));
    assert!(!message.contains("GEMINI_API_KEY"));
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let app = app(ScriptedClient::new(), RateLimitConfig::new());
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/")
        .header("origin", "https://app.example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "authorization,content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn cors_restricts_to_configured_origin() {
    let gateway = Gateway::builder()
        .model_client(Arc::new(ScriptedClient::new().always(LITE, "ok")))
        .tiers(test_tiers())
        .build()
        .unwrap();
    let app = router(
        AppState::ready(Arc::new(gateway)),
        Some("https://app.example.com"),
    );

    let mut request = post(json!({ "action": "chat", "payload": { "message": "hi" } }));
    request
        .headers_mut()
        .insert("origin", "https://app.example.com".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "https://app.example.com"
    );
}

#[tokio::test]
async fn health_reports_version() {
    let app = router(AppState::misconfigured("no key"), None);
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["version"], nutrigate::PKG_VERSION);
}
