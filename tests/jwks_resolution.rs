//! JWKS download and key resolution against a mock endpoint
//!
//! Covers the fetch contract (content type gate, malformed bodies,
//! transport failures, empty key sets) and the resolver protocol
//! (cache-first, exactly one fetch per cold resolution, refetch on
//! expiry, nothing retained with caching disabled).

use std::time::Duration;

use jwks_auth::{AuthError, CacheCapacity, JwksClient, KeyAge, KeyCache, download_keys};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn rsa_jwk(kid: &str) -> serde_json::Value {
    json!({
        "kty": "RSA",
        "kid": kid,
        "use": "sig",
        "alg": "RS256",
        "n": "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM72LvPqM",
        "e": "AQAB"
    })
}

async fn serve_keys(server: &MockServer, keys: Vec<serde_json::Value>, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": keys })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn jwks_uri(server: &MockServer) -> String {
    format!("{}/jwks", server.uri())
}

#[tokio::test]
async fn download_returns_published_keys_in_order() {
    let server = MockServer::start().await;
    serve_keys(&server, vec![rsa_jwk("k1"), rsa_jwk("k2")], 1).await;

    let keys = download_keys(&reqwest::Client::new(), &jwks_uri(&server))
        .await
        .unwrap();

    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0].common.key_id.as_deref(), Some("k1"));
    assert_eq!(keys[1].common.key_id.as_deref(), Some("k2"));
}

#[tokio::test]
async fn empty_key_set_is_not_an_error() {
    let server = MockServer::start().await;
    serve_keys(&server, vec![], 1).await;

    let keys = download_keys(&reqwest::Client::new(), &jwks_uri(&server))
        .await
        .unwrap();
    assert!(keys.is_empty());
}

#[tokio::test]
async fn json_charset_parameter_is_tolerated() {
    let server = MockServer::start().await;
    let body = json!({"keys": [rsa_jwk("k1")]}).to_string();
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json; charset=utf-8"))
        .mount(&server)
        .await;

    let keys = download_keys(&reqwest::Client::new(), &jwks_uri(&server))
        .await
        .unwrap();
    assert_eq!(keys.len(), 1);
}

#[tokio::test]
async fn wrong_content_type_wins_over_valid_json_body() {
    let server = MockServer::start().await;
    let body = json!({"keys": [rsa_jwk("k1")]}).to_string();
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/plain"))
        .mount(&server)
        .await;

    let err = download_keys(&reqwest::Client::new(), &jwks_uri(&server))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidContentType(ct) if ct.starts_with("text/plain")));
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("Invalid Data", "application/json"))
        .mount(&server)
        .await;

    let err = download_keys(&reqwest::Client::new(), &jwks_uri(&server))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::MalformedResponse(_)));
}

#[tokio::test]
async fn json_body_with_wrong_shape_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"not_keys": []})))
        .mount(&server)
        .await;

    let err = download_keys(&reqwest::Client::new(), &jwks_uri(&server))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::MalformedResponse(_)));
}

#[tokio::test]
async fn unreachable_endpoint_is_transport() {
    let err = download_keys(&reqwest::Client::new(), "http://127.0.0.1:1/jwks")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Transport(_)));
}

#[tokio::test]
async fn cold_then_warm_resolution_fetches_exactly_once() {
    let server = MockServer::start().await;
    serve_keys(&server, vec![rsa_jwk("k1"), rsa_jwk("k2")], 1).await;

    let client = JwksClient::new(jwks_uri(&server));

    let first = client.resolve_key("k1").await.unwrap();
    assert_eq!(first.common.key_id.as_deref(), Some("k1"));

    // Served from cache; the mock's expect(1) verifies zero extra fetches
    let second = client.resolve_key("k1").await.unwrap();
    assert_eq!(second.common.key_id, first.common.key_id);
    assert_eq!(client.cached_keys().await, 1);
}

#[tokio::test]
async fn only_the_requested_key_is_cached() {
    let server = MockServer::start().await;
    serve_keys(&server, vec![rsa_jwk("k1"), rsa_jwk("k2"), rsa_jwk("k3")], 1).await;

    let client = JwksClient::new(jwks_uri(&server));
    client.resolve_key("k2").await.unwrap();

    assert_eq!(client.cached_keys().await, 1);
}

#[tokio::test]
async fn unknown_kid_after_fetch_is_not_found() {
    let server = MockServer::start().await;
    serve_keys(&server, vec![rsa_jwk("k1")], 1).await;

    let client = JwksClient::new(jwks_uri(&server));
    let err = client.resolve_key("rotated-away").await.unwrap_err();

    assert!(matches!(err, AuthError::KeyNotFound { kid } if kid == "rotated-away"));
    assert_eq!(client.cached_keys().await, 0);
}

#[tokio::test]
async fn expired_entry_triggers_refetch() {
    let server = MockServer::start().await;
    serve_keys(&server, vec![rsa_jwk("k1")], 2).await;

    let cache = KeyCache::new(KeyAge::Max(Duration::ZERO), CacheCapacity::Unbounded);
    let client = JwksClient::with_cache(jwks_uri(&server), cache);

    // Each resolution finds its own insert already expired on the next
    // lookup, so both go to the network
    client.resolve_key("k1").await.unwrap();
    client.resolve_key("k1").await.unwrap();
}

#[tokio::test]
async fn disabled_cache_resolves_nothing() {
    let server = MockServer::start().await;
    serve_keys(&server, vec![rsa_jwk("k1")], 1).await;

    let cache = KeyCache::new(KeyAge::NeverExpire, CacheCapacity::Disabled);
    let client = JwksClient::with_cache(jwks_uri(&server), cache);

    let err = client.resolve_key("k1").await.unwrap_err();
    assert!(matches!(err, AuthError::KeyNotFound { .. }));
    assert_eq!(client.cached_keys().await, 0);
}

#[tokio::test]
async fn bounded_cache_keeps_hot_key_over_old_one() {
    let server = MockServer::start().await;
    serve_keys(&server, vec![rsa_jwk("k1"), rsa_jwk("k2")], 3).await;

    let cache = KeyCache::new(KeyAge::NeverExpire, CacheCapacity::Bounded(1));
    let client = JwksClient::with_cache(jwks_uri(&server), cache);

    client.resolve_key("k1").await.unwrap();
    client.resolve_key("k2").await.unwrap();
    assert_eq!(client.cached_keys().await, 1);

    // k1 was evicted for k2, so a third fetch is needed
    client.resolve_key("k1").await.unwrap();
}

#[tokio::test]
async fn fetch_failure_leaves_cache_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("Invalid Data", "application/json"))
        .mount(&server)
        .await;

    let client = JwksClient::new(jwks_uri(&server));
    let err = client.resolve_key("k1").await.unwrap_err();

    assert!(matches!(err, AuthError::MalformedResponse(_)));
    assert_eq!(client.cached_keys().await, 0);
}

#[tokio::test]
async fn concurrent_cold_resolutions_both_succeed() {
    let server = MockServer::start().await;
    // No single-flight dedup: up to one fetch per concurrent caller
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "keys": [rsa_jwk("k1")] })),
        )
        .mount(&server)
        .await;

    let client = std::sync::Arc::new(JwksClient::new(jwks_uri(&server)));
    let a = tokio::spawn({
        let client = client.clone();
        async move { client.resolve_key("k1").await }
    });
    let b = tokio::spawn({
        let client = client.clone();
        async move { client.resolve_key("k1").await }
    });

    assert!(a.await.unwrap().is_ok());
    assert!(b.await.unwrap().is_ok());
    assert_eq!(client.cached_keys().await, 1);
}
