//! Client auth state cache against a mocked "who am I" endpoint.

use std::sync::Arc;
use std::time::Duration;

use passage::auth::PrincipalInfo;
use passage::client::{AuthStateCache, ClientConfig, MemoryCookieJar, MemoryTokenStore};
use passage::domain::UserId;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn account_json(id: &UserId) -> serde_json::Value {
    serde_json::json!({
        "id": id.as_str(),
        "email": "user@x.com",
        "username": "user",
        "roles": ["member"],
    })
}

#[tokio::test]
async fn initialize_restores_session_from_stored_token() {
    let server = MockServer::start().await;
    let principal_id = UserId::new();

    Mock::given(method("GET"))
        .and(path("/auth/account"))
        .and(header("Authorization", "Bearer persisted-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_json(&principal_id)))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    store.set("persisted-token");
    let jar = Arc::new(MemoryCookieJar::new());

    let cache = AuthStateCache::new();
    let restored = cache
        .initialize(
            ClientConfig::new(server.uri())
                .with_timeout(Duration::from_secs(2))
                .with_store(store.clone())
                .with_cookies(jar.clone()),
        )
        .await
        .unwrap()
        .expect("session restored");

    assert_eq!(restored.id, principal_id);
    assert!(cache.is_initialized());
    assert_eq!(cache.principal().map(|p| p.id), Some(principal_id));

    // The token found in the store converged onto the cookie surface too.
    assert_eq!(jar.get("passage_session"), Some("persisted-token".to_string()));
    assert_eq!(cache.base_url().unwrap(), server.uri());
}

#[tokio::test]
async fn initialize_with_rejected_token_clears_every_surface() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/account"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    store.set("stale-token");
    let jar = Arc::new(MemoryCookieJar::new());
    jar.set("passage_session", "stale-token");

    let cache = AuthStateCache::new();
    let restored = cache
        .initialize(
            ClientConfig::new(server.uri())
                .with_store(store.clone())
                .with_cookies(jar.clone()),
        )
        .await
        .unwrap();

    assert!(restored.is_none());
    assert!(cache.token().is_none());
    assert!(store.get().is_none());
    assert!(jar.get("passage_session").is_none());
    assert!(cache.principal().is_none());
}

#[tokio::test]
async fn initialize_without_any_token_makes_no_network_call() {
    let server = MockServer::start().await;

    // Zero expected requests: the short-circuit must not touch the network.
    Mock::given(method("GET"))
        .and(path("/auth/account"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cache = AuthStateCache::new();
    let restored = cache
        .initialize(
            ClientConfig::new(server.uri())
                .with_store(Arc::new(MemoryTokenStore::new()))
                .with_cookies(Arc::new(MemoryCookieJar::new())),
        )
        .await
        .unwrap();

    assert!(restored.is_none());
    server.verify().await;
}

#[tokio::test]
async fn initialize_twice_is_idempotent_and_last_principal_wins() {
    let server = MockServer::start().await;
    let principal_id = UserId::new();

    Mock::given(method("GET"))
        .and(path("/auth/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_json(&principal_id)))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    store.set("persisted-token");

    let cache = AuthStateCache::new();
    let config = ClientConfig::new(server.uri()).with_store(store.clone());

    let first = cache.initialize(config.clone()).await.unwrap().unwrap();
    let second = cache.initialize(config).await.unwrap().unwrap();
    assert_eq!(first.id, second.id);
    assert!(cache.is_initialized());
}

#[tokio::test]
async fn subscriber_sees_restoration_and_clearing() {
    let server = MockServer::start().await;
    let principal_id = UserId::new();

    Mock::given(method("GET"))
        .and(path("/auth/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_json(&principal_id)))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    store.set("persisted-token");

    let cache = AuthStateCache::new();
    let events: Arc<std::sync::Mutex<Vec<Option<UserId>>>> = Arc::default();
    let sink = events.clone();
    cache.on_principal_change(move |principal: Option<&PrincipalInfo>| {
        sink.lock().unwrap().push(principal.map(|p| p.id.clone()));
    });

    cache
        .initialize(ClientConfig::new(server.uri()).with_store(store))
        .await
        .unwrap();
    cache.clear();

    let events = events.lock().unwrap();
    assert_eq!(events.as_slice(), &[Some(principal_id), None]);
}
