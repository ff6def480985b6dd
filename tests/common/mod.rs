#![allow(dead_code)]

use limelink::domain::repositories::{FlagStore, ReferrerProvider};
use limelink::infrastructure::http::HttpLinkRepository;
use limelink::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::{MockServer, Request};

pub const TEST_API_KEY: &str = "test-api-key";

/// Listener recording everything it receives, in order.
#[derive(Default)]
pub struct RecordingListener {
    received: Mutex<Vec<ResolutionResult>>,
    errors: Mutex<Vec<LinkError>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn received(&self) -> Vec<ResolutionResult> {
        self.received.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<LinkError> {
        self.errors.lock().unwrap().clone()
    }
}

impl LinkListener for RecordingListener {
    fn on_link_received(&self, result: &ResolutionResult) {
        self.received.lock().unwrap().push(result.clone());
    }

    fn on_link_error(&self, error: &LinkError) {
        self.errors.lock().unwrap().push(error.clone());
    }
}

pub fn test_config(server: &MockServer) -> Config {
    Config::builder(TEST_API_KEY)
        .base_url(server.uri())
        .request_timeout_secs(2)
        .build()
        .unwrap()
}

pub fn create_orchestrator(
    config: Config,
    flag_store: Arc<dyn FlagStore>,
    referrer_provider: Arc<dyn ReferrerProvider>,
) -> (Orchestrator, Arc<RecordingListener>) {
    let repository = Arc::new(HttpLinkRepository::from_config(&config).unwrap());
    let orchestrator = Orchestrator::new(
        config,
        Collaborators {
            repository,
            flag_store,
            referrer_provider,
        },
    );

    let listener = RecordingListener::new();
    orchestrator.add_link_listener(listener.clone());
    (orchestrator, listener)
}

/// Orchestrator with an in-memory flag store and no install referrer.
pub fn create_test_orchestrator(server: &MockServer) -> (Orchestrator, Arc<RecordingListener>) {
    create_orchestrator(
        test_config(server),
        Arc::new(MemoryFlagStore::new()),
        Arc::new(StaticReferrerProvider::unsupported()),
    )
}

/// Orchestrator with an in-memory flag store and the given install referrer.
pub fn create_deferred_orchestrator(
    server: &MockServer,
    referrer: &str,
) -> (Orchestrator, Arc<RecordingListener>) {
    create_orchestrator(
        test_config(server),
        Arc::new(MemoryFlagStore::new()),
        Arc::new(StaticReferrerProvider::from_referrer(referrer)),
    )
}

/// Requests received on `path`, in arrival order.
pub async fn requests_to(server: &MockServer, path: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == path)
        .collect()
}

/// Polls until `count` requests reached `path`, or two seconds passed.
pub async fn wait_for_requests(server: &MockServer, path: &str, count: usize) -> Vec<Request> {
    for _ in 0..100 {
        let requests = requests_to(server, path).await;
        if requests.len() >= count {
            return requests;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    requests_to(server, path).await
}

pub fn query_value(request: &Request, key: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
