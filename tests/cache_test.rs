//! Analysis cache store tests.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nutrigate::GatewayError;
use nutrigate::cache::{
    CacheStore, MemoryCacheConfig, MemoryCacheStore, PostgrestCacheStore, image_hash,
};

const HASH: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

// ============================================================================
// In-memory store
// ============================================================================

#[tokio::test]
async fn memory_store_round_trip() {
    let store = MemoryCacheStore::default();
    assert_eq!(store.get(HASH).await.unwrap(), None);

    let analysis = json!({ "isFood": true, "totals": { "calories": 420 } });
    store.insert(HASH, &analysis).await.unwrap();
    assert_eq!(store.get(HASH).await.unwrap(), Some(analysis));
}

#[tokio::test]
async fn memory_store_keeps_first_record() {
    let store = MemoryCacheStore::default();
    store.insert(HASH, &json!({ "v": 1 })).await.unwrap();
    store.insert(HASH, &json!({ "v": 2 })).await.unwrap();
    assert_eq!(store.get(HASH).await.unwrap(), Some(json!({ "v": 1 })));
}

#[tokio::test]
async fn memory_store_expires_after_ttl() {
    let store = MemoryCacheStore::new(&MemoryCacheConfig::new().ttl(Duration::from_millis(50)));
    store.insert(HASH, &json!({ "v": 1 })).await.unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(store.get(HASH).await.unwrap(), None);
}

#[test]
fn hash_is_lowercase_hex_sha256() {
    // sha256("test")
    assert_eq!(image_hash(b"test", 64 * 1024), HASH);
}

// ============================================================================
// PostgREST store
// ============================================================================

#[tokio::test]
async fn postgrest_lookup_hit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/food_analysis_cache"))
        .and(query_param("image_hash", format!("eq.{HASH}")))
        .and(query_param("select", "analysis_result"))
        .and(query_param("limit", "1"))
        .and(header("apikey", "service-key"))
        .and(header("Authorization", "Bearer service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "analysis_result": { "isFood": true, "mealName": "Pho" } }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store = PostgrestCacheStore::new(server.uri(), "service-key").unwrap();
    let hit = store.get(HASH).await.unwrap();
    assert_eq!(hit, Some(json!({ "isFood": true, "mealName": "Pho" })));
}

#[tokio::test]
async fn postgrest_lookup_miss() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/food_analysis_cache"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = PostgrestCacheStore::new(server.uri(), "service-key").unwrap();
    assert_eq!(store.get(HASH).await.unwrap(), None);
}

#[tokio::test]
async fn postgrest_lookup_failure_is_cache_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/food_analysis_cache"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = PostgrestCacheStore::new(server.uri(), "service-key").unwrap();
    assert!(matches!(store.get(HASH).await, Err(GatewayError::Cache(_))));
}

#[tokio::test]
async fn postgrest_insert_posts_row() {
    let server = MockServer::start().await;
    let analysis = json!({ "isFood": true, "items": [] });
    Mock::given(method("POST"))
        .and(path("/rest/v1/photo_cache"))
        .and(header("Prefer", "return=minimal"))
        .and(header("apikey", "service-key"))
        .and(body_json(json!({ "image_hash": HASH, "analysis_result": analysis })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let store = PostgrestCacheStore::new(format!("{}/", server.uri()), "service-key")
        .unwrap()
        .table("photo_cache");
    store.insert(HASH, &analysis).await.unwrap();
}

#[tokio::test]
async fn postgrest_duplicate_insert_is_cache_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/food_analysis_cache"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint"
        })))
        .mount(&server)
        .await;

    let store = PostgrestCacheStore::new(server.uri(), "service-key").unwrap();
    let result = store.insert(HASH, &json!({ "isFood": true })).await;
    assert!(matches!(result, Err(GatewayError::Cache(_))));
}

#[test]
fn postgrest_debug_hides_key() {
    let store = PostgrestCacheStore::new("https://db.example.com", "service-key").unwrap();
    assert!(!format!("{store:?}").contains("service-key"));
}
