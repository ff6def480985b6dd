//! Link resolution service.

use std::sync::Arc;

use crate::domain::entities::{ClassifiedLink, LinkUri, TokenLink};
use crate::domain::repositories::{
    DeferredLinkRequest, DynamicLinkRequest, LegacyLinkRequest, LinkRepository,
};
use crate::error::{ApiError, ResolveError};

/// Query key carrying the URL the user opened.
pub const FULL_REQUEST_URL_KEY: &str = "full_request_url";

/// Maps classified links to in-app navigation targets through the remote
/// lookup service.
///
/// Every resolution is exactly one remote call. There is no local retry and
/// no caching: a failed lookup is final for that event.
pub struct ResolverService<R: LinkRepository + ?Sized> {
    repository: Arc<R>,
    platform: String,
}

impl<R: LinkRepository + ?Sized> ResolverService<R> {
    /// Creates a new resolver. `platform` is sent with legacy lookups.
    pub fn new(repository: Arc<R>, platform: impl Into<String>) -> Self {
        Self {
            repository,
            platform: platform.into(),
        }
    }

    /// Resolves a classified link to its navigation target.
    ///
    /// Subdomain links are looked up by link suffix, with the inbound URL as
    /// `full_request_url` and its query parameters merged in. Legacy links are
    /// looked up by subdomain, path and platform.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotALink`] for [`ClassifiedLink::NotALink`]
    /// without calling the service. Returns [`ResolveError::Api`] when the
    /// lookup fails, including when the identifier is unknown.
    pub async fn resolve(
        &self,
        link: &ClassifiedLink,
        uri: &LinkUri,
    ) -> Result<String, ResolveError> {
        let outcome = match link {
            ClassifiedLink::Subdomain { suffix, link_suffix } => {
                tracing::debug!(%suffix, %link_suffix, "Resolving subdomain link");

                let request = DynamicLinkRequest {
                    link_suffix: link_suffix.clone(),
                    full_request_url: Some(uri.as_str().to_string()),
                    params: uri
                        .query_pairs()
                        .iter()
                        .filter(|(key, _)| key != FULL_REQUEST_URL_KEY)
                        .cloned()
                        .collect(),
                };
                self.repository.find_dynamic_link(&request).await
            }
            ClassifiedLink::Legacy { subdomain, path } => {
                tracing::debug!(%subdomain, %path, "Resolving legacy link");

                let request = LegacyLinkRequest {
                    subdomain: subdomain.clone(),
                    path: path.clone(),
                    platform: self.platform.clone(),
                };
                self.repository.find_legacy_link(&request).await
            }
            ClassifiedLink::NotALink => return Err(ResolveError::NotALink),
        };

        outcome.map_err(|e| {
            log_failure(link.identifier().unwrap_or_default(), &e);
            ResolveError::from(e)
        })
    }

    /// Resolves a suffix recovered from an install referrer, using the
    /// `setup` event marker.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Api`] when the lookup fails.
    pub async fn resolve_deferred(
        &self,
        suffix: &str,
        full_request_url: Option<&str>,
    ) -> Result<String, ResolveError> {
        tracing::debug!(%suffix, "Resolving deferred link");

        let request = DeferredLinkRequest {
            suffix: suffix.to_string(),
            full_request_url: full_request_url.map(str::to_string),
        };

        self.repository
            .find_deferred_link(&request)
            .await
            .map_err(|e| {
                log_failure(suffix, &e);
                ResolveError::from(e)
            })
    }

    /// Looks up the deferred link registered under a referrer token.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Api`] when the lookup fails.
    pub async fn resolve_token(&self, token: &str) -> Result<TokenLink, ResolveError> {
        tracing::debug!(%token, "Resolving token link");

        self.repository
            .find_deferred_link_by_token(token)
            .await
            .map_err(|e| {
                log_failure(token, &e);
                ResolveError::from(e)
            })
    }

    /// Returns whether a token is already registered with the service.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Api`] when the check fails.
    pub async fn token_exists(&self, token: &str) -> Result<bool, ResolveError> {
        self.repository.check_token(token).await.map_err(|e| {
            log_failure(token, &e);
            ResolveError::from(e)
        })
    }
}

fn log_failure(identifier: &str, error: &ApiError) {
    match error {
        ApiError::NotFound(_) => {
            tracing::warn!(%identifier, "Link suffix not found");
        }
        ApiError::Http { status } => {
            tracing::warn!(%identifier, status, "Link lookup failed with HTTP error");
        }
        ApiError::Transport(_) | ApiError::MalformedResponse(_) => {
            tracing::error!(%identifier, error = %error, "Link lookup failed");
        }
    }
}
