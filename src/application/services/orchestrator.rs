//! SDK facade sequencing classification, resolution, attribution and
//! listener delivery.

use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::application::services::{LaunchTracker, ResolverService, StatsService};
use crate::application::stats_worker::run_stats_worker;
use crate::config::{Config, mask_api_key};
use crate::domain::entities::{
    AttributionRecord, ClassifiedLink, LinkUri, ReferrerCandidate, ReferrerDetails,
    ResolutionResult, TokenLink,
};
use crate::domain::listener::{LinkListener, ListenerRegistry};
use crate::domain::repositories::{FlagStore, LinkRepository, ReferrerProvider};
use crate::domain::stats_event::StatsEvent;
use crate::error::{ApiError, LinkError, ResolveError};
use crate::infrastructure::http::HttpLinkRepository;
use crate::utils::link_classifier::LinkClassifier;
use crate::utils::link_params::{parse_path_params, parse_query_params};
use crate::utils::referrer_extractor::{DEFAULT_TOKEN_KEY, ReferrerExtractor, extract_token};

/// Referrer key carrying a bare link suffix.
pub const DEFERRED_CODE_KEY: &str = "code";

/// External collaborators of an [`Orchestrator`].
#[derive(Clone)]
pub struct Collaborators {
    pub repository: Arc<dyn LinkRepository>,
    pub flag_store: Arc<dyn FlagStore>,
    pub referrer_provider: Arc<dyn ReferrerProvider>,
}

enum DeliveryEvent {
    Received(ResolutionResult),
    Error(LinkError),
}

struct Delivery {
    event: DeliveryEvent,
    ack: oneshot::Sender<()>,
}

struct Inner {
    config: Config,
    classifier: LinkClassifier,
    extractor: ReferrerExtractor,
    resolver: ResolverService<dyn LinkRepository>,
    tracker: Arc<LaunchTracker<dyn FlagStore>>,
    referrer_provider: Arc<dyn ReferrerProvider>,
    listeners: Arc<ListenerRegistry>,
    delivery_tx: mpsc::Sender<Delivery>,
    stats_tx: mpsc::Sender<StatsEvent>,
    last_seen: Mutex<Option<String>>,
}

/// Explicit SDK context object.
///
/// Owns the listener registry, the delivery task and the stats worker. Cheap
/// to clone; clones share all state. Independent instances share nothing,
/// except what their collaborators share. Instances over the same flag store
/// still consume the first launch only once between them.
///
/// # Delivery
///
/// Listeners are only ever invoked from the delivery task, one delivery at a
/// time, in the order resolutions complete. A panicking listener is logged
/// and does not prevent delivery to the others.
///
/// # Background Tasks
///
/// The delivery task and the stats worker run until the last clone of the
/// orchestrator (and every in-flight [`LinkTask`]) has been dropped.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    /// Creates an orchestrator and spawns its background tasks.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(config: Config, collaborators: Collaborators) -> Self {
        let Collaborators {
            repository,
            flag_store,
            referrer_provider,
        } = collaborators;

        let tracker: Arc<LaunchTracker<dyn FlagStore>> = Arc::new(LaunchTracker::new(flag_store));
        let listeners = Arc::new(ListenerRegistry::new());

        let (delivery_tx, delivery_rx) = mpsc::channel(config.delivery_queue_capacity.max(1));
        tokio::spawn(run_delivery(delivery_rx, listeners.clone()));

        let stats_service = Arc::new(StatsService::new(
            repository.clone(),
            tracker.clone(),
            config.api_key.clone(),
            config.platform.clone(),
        ));
        let (stats_tx, stats_rx) = mpsc::channel(config.stats_queue_capacity.max(1));
        tokio::spawn(run_stats_worker(stats_rx, stats_service));

        let inner = Inner {
            classifier: LinkClassifier::new(&config.root_domain, &config.legacy_host),
            extractor: ReferrerExtractor::new(&config.root_domain),
            resolver: ResolverService::new(repository, config.platform.clone()),
            tracker,
            referrer_provider,
            listeners,
            delivery_tx,
            stats_tx,
            last_seen: Mutex::new(None),
            config,
        };

        let orchestrator = Self {
            inner: Arc::new(inner),
        };
        orchestrator.log(&format!(
            "SDK initialized with apiKey={}",
            mask_api_key(&orchestrator.inner.config.api_key)
        ));
        orchestrator
    }

    /// Creates an orchestrator talking to the lookup service at
    /// `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be built.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn connect(
        config: Config,
        flag_store: Arc<dyn FlagStore>,
        referrer_provider: Arc<dyn ReferrerProvider>,
    ) -> Result<Self, ApiError> {
        let repository = Arc::new(HttpLinkRepository::from_config(&config)?);
        Ok(Self::new(
            config,
            Collaborators {
                repository,
                flag_store,
                referrer_provider,
            },
        ))
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Registers a listener. Returns false if it was already registered.
    pub fn add_link_listener(&self, listener: Arc<dyn LinkListener>) -> bool {
        self.inner.listeners.add(listener)
    }

    /// Unregisters a listener. Returns false if it was not registered.
    pub fn remove_link_listener(&self, listener: &Arc<dyn LinkListener>) -> bool {
        self.inner.listeners.remove(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Returns true if `raw` looks like a link by scheme and host alone.
    pub fn is_universal_link(&self, raw: &str) -> bool {
        LinkUri::parse(raw).is_ok_and(|uri| self.inner.classifier.is_universal_link(&uri))
    }

    /// Classifies a raw URI. Unparseable input is [`ClassifiedLink::NotALink`].
    pub fn classify(&self, raw: &str) -> ClassifiedLink {
        LinkUri::parse(raw)
            .map(|uri| self.inner.classifier.classify(&uri))
            .unwrap_or(ClassifiedLink::NotALink)
    }

    /// Handles an inbound URI opened by the user.
    ///
    /// Returns `None`, without any listener call, when the URI is unparseable,
    /// equal to the previously handled raw URI, or not a link. Otherwise the
    /// resolution runs on a spawned task: on success listeners receive a
    /// direct [`ResolutionResult`] and a stats event is queued; on failure
    /// listeners receive exactly one [`LinkError`].
    pub fn handle_link(&self, raw: &str) -> Option<LinkTask> {
        let uri = match LinkUri::parse(raw) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unparseable link");
                return None;
            }
        };

        if !self.mark_seen(&uri) {
            self.log(&format!("Duplicate link ignored: {}", uri));
            return None;
        }

        let link = self.inner.classifier.classify(&uri);
        if !link.is_link() {
            self.log(&format!("Not a link: {}", uri));
            return None;
        }

        self.log(&format!("Handling link {}", uri));
        let orchestrator = self.clone();
        let handle = tokio::spawn(async move { orchestrator.run_link(link, uri).await });
        Some(LinkTask { handle })
    }

    /// Runs the deferred deep link check.
    ///
    /// The first-launch flag is consumed before this returns, and before any
    /// network call is made. Returns `None` when the check is disabled or
    /// this is not the first launch.
    ///
    /// On the spawned task, the install referrer is fetched and searched for
    /// a link. When the link carries a suffix (a subdomain link, or a `code`
    /// token in the referrer) it is resolved with the `setup` marker; a failed
    /// lookup suppresses the dispatch. Without a suffix the recovered URL is
    /// itself the target. Deferred results never produce stats events.
    pub fn check_deferred(&self) -> Option<LinkTask> {
        if !self.inner.config.deferred_deeplink_enabled {
            self.log("Deferred deep links disabled, skipping check");
            return None;
        }

        if !self.inner.tracker.check_and_consume() {
            self.log("Not first launch, skipping deferred deeplink check");
            return None;
        }

        self.log("First launch detected, checking deferred deeplink");
        let orchestrator = self.clone();
        let handle = tokio::spawn(async move { orchestrator.run_deferred().await });
        Some(LinkTask { handle })
    }

    /// Resolves a known deferred suffix with the `setup` marker, without the
    /// first-launch gate and without dispatching.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Api`] when the lookup fails.
    pub async fn resolve_deferred(
        &self,
        suffix: &str,
        full_request_url: Option<&str>,
    ) -> Result<String, ResolveError> {
        self.inner
            .resolver
            .resolve_deferred(suffix, full_request_url)
            .await
    }

    /// Resolves a link without dispatching, deduplicating or reporting.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotALink`] when the URI is not a link and
    /// [`ResolveError::Api`] when the lookup fails.
    pub async fn resolve_link(&self, uri: &LinkUri) -> Result<ResolutionResult, ResolveError> {
        let link = self.inner.classifier.classify(uri);
        let target = self.inner.resolver.resolve(&link, uri).await?;
        Ok(ResolutionResult::direct(
            uri.as_str(),
            Some(target),
            parse_query_params(uri),
            parse_path_params(uri),
        ))
    }

    /// Looks up the deferred link registered under the `token` carried in the
    /// install referrer.
    ///
    /// Independent of the first-launch flag and of listeners: nothing is
    /// consumed, dispatched or reported. Returns `Ok(None)` when the referrer
    /// cannot be fetched or carries no token.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Api`] when the token lookup fails.
    pub async fn resolve_referrer_token(&self) -> Result<Option<TokenLink>, ResolveError> {
        let details = match self.inner.referrer_provider.install_referrer().await {
            Ok(details) => details,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch install referrer");
                return Ok(None);
            }
        };

        let Some(token) = extract_token(&details.referrer_url, DEFAULT_TOKEN_KEY) else {
            self.log("No token found in referrer");
            return Ok(None);
        };

        self.inner.resolver.resolve_token(&token).await.map(Some)
    }

    /// Looks up the deferred link registered under `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Api`] when the lookup fails.
    pub async fn resolve_token(&self, token: &str) -> Result<TokenLink, ResolveError> {
        self.inner.resolver.resolve_token(token).await
    }

    /// Returns whether `token` is already registered with the service.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Api`] when the check fails.
    pub async fn token_exists(&self, token: &str) -> Result<bool, ResolveError> {
        self.inner.resolver.token_exists(token).await
    }

    async fn run_link(&self, link: ClassifiedLink, uri: LinkUri) -> Option<ResolutionResult> {
        let target = match self.inner.resolver.resolve(&link, &uri).await {
            Ok(target) => target,
            Err(e) => {
                self.dispatch(DeliveryEvent::Error(LinkError::from(&e))).await;
                return None;
            }
        };

        let path_params = parse_path_params(&uri);
        let result = ResolutionResult::direct(
            uri.as_str(),
            Some(target),
            parse_query_params(&uri),
            path_params.clone(),
        );

        if self
            .dispatch(DeliveryEvent::Received(result.clone()))
            .await
        {
            self.enqueue_stats(StatsEvent::from(path_params));
        }
        Some(result)
    }

    async fn run_deferred(&self) -> Option<ResolutionResult> {
        let details = match self.inner.referrer_provider.install_referrer().await {
            Ok(details) => details,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch install referrer");
                return None;
            }
        };

        let Some(candidate) = self.inner.extractor.extract(&details.referrer_url) else {
            self.log("No deferred deeplink found in referrer");
            return None;
        };

        let result = self.build_deferred(details, candidate).await?;
        self.dispatch(DeliveryEvent::Received(result.clone()))
            .await
            .then_some(result)
    }

    async fn build_deferred(
        &self,
        details: ReferrerDetails,
        candidate: ReferrerCandidate,
    ) -> Option<ResolutionResult> {
        let candidate_uri = LinkUri::parse(&candidate.full_url).ok();

        let suffix = match candidate_uri
            .as_ref()
            .map(|uri| self.inner.classifier.classify(uri))
        {
            Some(ClassifiedLink::Subdomain { link_suffix, .. }) => Some(link_suffix),
            _ => extract_token(&details.referrer_url, DEFERRED_CODE_KEY),
        };

        let resolved_target = match suffix {
            Some(suffix) => {
                match self
                    .inner
                    .resolver
                    .resolve_deferred(&suffix, Some(&candidate.full_url))
                    .await
                {
                    Ok(target) => Some(target),
                    Err(_) => {
                        self.log("Deferred link lookup failed, skipping dispatch");
                        return None;
                    }
                }
            }
            None => Some(candidate.full_url.clone()),
        };

        let path_params = candidate_uri
            .as_ref()
            .map(parse_path_params)
            .unwrap_or_default();

        Some(ResolutionResult::deferred(
            candidate.full_url.clone(),
            resolved_target,
            candidate.query_params.clone(),
            path_params,
            AttributionRecord::new(details, Some(candidate)),
        ))
    }

    /// Records `uri` as the last seen raw value. Returns false if it was
    /// already the last seen one.
    fn mark_seen(&self, uri: &LinkUri) -> bool {
        let mut last_seen = self
            .inner
            .last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if last_seen.as_deref() == Some(uri.as_str()) {
            return false;
        }
        *last_seen = Some(uri.as_str().to_string());
        true
    }

    /// Hands an event to the delivery task and waits until every listener
    /// has seen it. Returns false if the delivery task is gone.
    async fn dispatch(&self, event: DeliveryEvent) -> bool {
        let (ack, delivered) = oneshot::channel();
        if self
            .inner
            .delivery_tx
            .send(Delivery { event, ack })
            .await
            .is_err()
        {
            tracing::error!("Delivery task stopped, dropping link event");
            return false;
        }
        delivered.await.is_ok()
    }

    fn enqueue_stats(&self, event: StatsEvent) {
        match self.inner.stats_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(ev)) => {
                tracing::warn!(suffix = %ev.suffix, "Stats queue full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::error!("Stats worker stopped, dropping event");
            }
        }
    }

    fn log(&self, message: &str) {
        if self.inner.config.logging_enabled {
            tracing::info!("{}", message);
        }
    }
}

async fn run_delivery(mut rx: mpsc::Receiver<Delivery>, listeners: Arc<ListenerRegistry>) {
    while let Some(delivery) = rx.recv().await {
        for listener in listeners.snapshot() {
            let outcome = catch_unwind(AssertUnwindSafe(|| match &delivery.event {
                DeliveryEvent::Received(result) => listener.on_link_received(result),
                DeliveryEvent::Error(error) => listener.on_link_error(error),
            }));
            if outcome.is_err() {
                tracing::error!("Link listener panicked");
            }
        }
        let _ = delivery.ack.send(());
    }
}

/// Handle to an in-flight link or deferred check.
///
/// Awaiting yields the dispatched result once every listener has received it,
/// or `None` if nothing was dispatched, the task failed or was cancelled.
/// Dropping the handle detaches the task; it keeps running.
pub struct LinkTask {
    handle: JoinHandle<Option<ResolutionResult>>,
}

impl LinkTask {
    /// Aborts the task. An event already handed to the delivery task is still
    /// delivered; nothing is dispatched afterwards.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Future for LinkTask {
    type Output = Option<ResolutionResult>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| match joined {
            Ok(result) => result,
            Err(e) => {
                if e.is_panic() {
                    tracing::error!("Link task panicked");
                }
                None
            }
        })
    }
}
