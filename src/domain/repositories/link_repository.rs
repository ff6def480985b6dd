//! Repository trait for the remote link lookup service.

use crate::domain::entities::TokenLink;
use crate::domain::stats_event::StatsEventRequest;
use crate::error::ApiError;
use async_trait::async_trait;

/// Marker sent as `event_type` when resolving a deferred link.
pub const SETUP_EVENT_TYPE: &str = "setup";

/// Lookup of a subdomain-style link (`GET /api/v1/app/dynamic_link/{link_suffix}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicLinkRequest {
    pub link_suffix: String,
    /// Sent as `full_request_url` when present.
    pub full_request_url: Option<String>,
    /// Query parameters of the original link, merged into the request query.
    pub params: Vec<(String, String)>,
}

/// Lookup of a legacy link (`GET /link`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyLinkRequest {
    pub subdomain: String,
    pub path: String,
    pub platform: String,
}

/// Lookup of a deferred link after install
/// (`GET /api/v1/app/dynamic_link/{suffix}?event_type=setup`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredLinkRequest {
    pub suffix: String,
    pub full_request_url: Option<String>,
}

/// Repository interface for the remote link service.
///
/// Every call issues exactly one request; implementations do not retry.
///
/// # Implementations
///
/// - [`crate::infrastructure::http::HttpLinkRepository`] - reqwest-backed client
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Resolves a subdomain-style link to its navigation target.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the suffix is unknown, and
    /// [`ApiError::Http`], [`ApiError::Transport`] or
    /// [`ApiError::MalformedResponse`] for every other failure.
    async fn find_dynamic_link(&self, request: &DynamicLinkRequest) -> Result<String, ApiError>;

    /// Resolves a legacy link to its navigation target.
    ///
    /// # Errors
    ///
    /// Same as [`LinkRepository::find_dynamic_link`].
    async fn find_legacy_link(&self, request: &LegacyLinkRequest) -> Result<String, ApiError>;

    /// Resolves the link that led to an install, flagged with the `setup` event.
    ///
    /// # Errors
    ///
    /// Same as [`LinkRepository::find_dynamic_link`].
    async fn find_deferred_link(&self, request: &DeferredLinkRequest)
    -> Result<String, ApiError>;

    /// Looks up the deferred link registered under a referrer token
    /// (`GET /api/v1/deferred-deep-link/token/{token}`).
    ///
    /// # Errors
    ///
    /// Same as [`LinkRepository::find_dynamic_link`], with the token as the
    /// [`ApiError::NotFound`] identifier.
    async fn find_deferred_link_by_token(&self, token: &str) -> Result<TokenLink, ApiError>;

    /// Asks whether a token is already registered
    /// (`GET /api/v1/deferred-deep-link/check-token?token=`).
    ///
    /// # Errors
    ///
    /// Same as [`LinkRepository::find_dynamic_link`].
    async fn check_token(&self, token: &str) -> Result<bool, ApiError>;

    /// Posts a stats event (`POST /api/v1/stats/event`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] for non-2xx responses and
    /// [`ApiError::Transport`] when the request cannot be sent.
    async fn send_stats_event(&self, request: &StatsEventRequest) -> Result<(), ApiError>;
}
