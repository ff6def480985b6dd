mod common;

use common::requests_to;
use limelink::domain::repositories::{FIRST_LAUNCH_KEY, FlagStore, ReferrerError};
use limelink::prelude::*;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/api/v1/deferred-deep-link/token/spring-token";

async fn mount_token_link(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "parameters": { "screen": "product" },
            "fallback_url": "https://limelink.org/fallback",
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_referrer_token_resolved() {
    let server = MockServer::start().await;
    mount_token_link(&server).await;

    let store = Arc::new(MemoryFlagStore::new());
    let (sdk, listener) = common::create_orchestrator(
        common::test_config(&server),
        store.clone(),
        Arc::new(StaticReferrerProvider::from_referrer(
            "utm_source=google&token=spring-token",
        )),
    );

    let link = sdk.resolve_referrer_token().await.unwrap().unwrap();

    assert_eq!(link.token, "spring-token");
    assert_eq!(link.parameter("screen").as_deref(), Some("product"));
    assert_eq!(link.store_url("android"), Some("https://limelink.org/fallback"));

    // neither the flag nor the listeners are touched
    assert!(store.get_bool(FIRST_LAUNCH_KEY, true).unwrap());
    assert!(listener.received().is_empty());
    assert_eq!(requests_to(&server, TOKEN_PATH).await.len(), 1);
}

#[tokio::test]
async fn test_referrer_without_token_skips_lookup() {
    let server = MockServer::start().await;
    let (sdk, _listener) =
        common::create_deferred_orchestrator(&server, "utm_source=google&mytoken=abc");

    assert!(sdk.resolve_referrer_token().await.unwrap().is_none());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unavailable_referrer_yields_no_token() {
    let server = MockServer::start().await;
    let (sdk, _listener) = common::create_orchestrator(
        common::test_config(&server),
        Arc::new(MemoryFlagStore::new()),
        Arc::new(StaticReferrerProvider::failing(ReferrerError::Unavailable)),
    );

    assert!(sdk.resolve_referrer_token().await.unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_token_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (sdk, listener) = common::create_deferred_orchestrator(&server, "token=gone");

    let err = sdk.resolve_referrer_token().await.unwrap_err();

    assert_eq!(err.code(), 404);
    assert!(listener.errors().is_empty());
}

#[tokio::test]
async fn test_token_exists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/deferred-deep-link/check-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "is_exist": true })))
        .expect(1)
        .mount(&server)
        .await;

    let (sdk, _listener) = common::create_test_orchestrator(&server);

    assert!(sdk.token_exists("spring-token").await.unwrap());
}
