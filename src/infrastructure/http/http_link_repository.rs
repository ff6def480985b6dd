//! HTTP implementation of the link repository.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::domain::entities::TokenLink;
use crate::domain::repositories::{
    DeferredLinkRequest, DynamicLinkRequest, LegacyLinkRequest, LinkRepository, SETUP_EVENT_TYPE,
};
use crate::domain::stats_event::StatsEventRequest;
use crate::error::ApiError;

const DYNAMIC_LINK_PATH: &[&str] = &["api", "v1", "app", "dynamic_link"];
const LEGACY_LINK_PATH: &[&str] = &["link"];
const STATS_EVENT_PATH: &[&str] = &["api", "v1", "stats", "event"];
const TOKEN_LINK_PATH: &[&str] = &["api", "v1", "deferred-deep-link", "token"];
const CHECK_TOKEN_PATH: &[&str] = &["api", "v1", "deferred-deep-link", "check-token"];

#[derive(Debug, Deserialize)]
struct DynamicLinkResponse {
    uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeeplinkResponse {
    deeplink_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TokenLinkResponse {
    parameters: Option<HashMap<String, serde_json::Value>>,
    ios_app_store_url: Option<String>,
    android_play_store_url: Option<String>,
    fallback_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CheckTokenResponse {
    is_exist: bool,
}

/// Link repository backed by the remote lookup service.
///
/// Each call is a single request with the configured timeout. Status codes
/// map to [`ApiError`]: 404 is [`ApiError::NotFound`], any other non-2xx is
/// [`ApiError::Http`], connection failures and timeouts are
/// [`ApiError::Transport`] and undecodable bodies are
/// [`ApiError::MalformedResponse`].
pub struct HttpLinkRepository {
    client: Client,
    base_url: Url,
}

impl HttpLinkRepository {
    /// Creates a repository for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the base URL is not an absolute
    /// http(s) URL or the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ApiError::Transport(format!("Invalid base URL '{}'", base_url)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Creates a repository from the SDK configuration.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        url.set_query(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        identifier: &str,
    ) -> Result<T, ApiError> {
        let response = check_status(request.send().await, identifier)?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }
}

fn check_status(
    sent: reqwest::Result<reqwest::Response>,
    identifier: &str,
) -> Result<reqwest::Response, ApiError> {
    let response = sent.map_err(|e| ApiError::Transport(e.to_string()))?;
    match response.status() {
        StatusCode::NOT_FOUND => Err(ApiError::NotFound(identifier.to_string())),
        status if !status.is_success() => Err(ApiError::Http {
            status: status.as_u16(),
        }),
        _ => Ok(response),
    }
}

#[async_trait]
impl LinkRepository for HttpLinkRepository {
    async fn find_dynamic_link(&self, request: &DynamicLinkRequest) -> Result<String, ApiError> {
        let mut segments: Vec<&str> = DYNAMIC_LINK_PATH.to_vec();
        segments.push(request.link_suffix.as_str());

        let mut query: Vec<(&str, &str)> = Vec::with_capacity(request.params.len() + 1);
        if let Some(full_request_url) = &request.full_request_url {
            query.push(("full_request_url", full_request_url.as_str()));
        }
        query.extend(request.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let http = self.client.get(self.endpoint(&segments)).query(&query);
        let body: DynamicLinkResponse = self.fetch(http, &request.link_suffix).await?;

        tracing::debug!(link_suffix = %request.link_suffix, uri = %body.uri, "Received dynamic link");
        Ok(body.uri)
    }

    async fn find_legacy_link(&self, request: &LegacyLinkRequest) -> Result<String, ApiError> {
        let query = [
            ("subdomain", request.subdomain.as_str()),
            ("path", request.path.as_str()),
            ("platform", request.platform.as_str()),
        ];

        let http = self.client.get(self.endpoint(LEGACY_LINK_PATH)).query(&query);
        let body: DeeplinkResponse = self.fetch(http, &request.path).await?;

        tracing::debug!(path = %request.path, uri = %body.deeplink_url, "Received legacy deeplink");
        Ok(body.deeplink_url)
    }

    async fn find_deferred_link(
        &self,
        request: &DeferredLinkRequest,
    ) -> Result<String, ApiError> {
        let mut segments: Vec<&str> = DYNAMIC_LINK_PATH.to_vec();
        segments.push(request.suffix.as_str());

        let mut query: Vec<(&str, &str)> = Vec::with_capacity(2);
        if let Some(full_request_url) = &request.full_request_url {
            query.push(("full_request_url", full_request_url.as_str()));
        }
        query.push(("event_type", SETUP_EVENT_TYPE));

        let http = self.client.get(self.endpoint(&segments)).query(&query);
        let body: DynamicLinkResponse = self.fetch(http, &request.suffix).await?;

        tracing::debug!(suffix = %request.suffix, uri = %body.uri, "Received deferred link");
        Ok(body.uri)
    }

    async fn find_deferred_link_by_token(&self, token: &str) -> Result<TokenLink, ApiError> {
        let mut segments: Vec<&str> = TOKEN_LINK_PATH.to_vec();
        segments.push(token);

        let http = self.client.get(self.endpoint(&segments));
        let body: TokenLinkResponse = self.fetch(http, token).await?;

        tracing::debug!(%token, "Received token link");
        Ok(TokenLink {
            token: token.to_string(),
            parameters: body.parameters.unwrap_or_default(),
            ios_app_store_url: body.ios_app_store_url,
            android_play_store_url: body.android_play_store_url,
            fallback_url: body.fallback_url,
        })
    }

    async fn check_token(&self, token: &str) -> Result<bool, ApiError> {
        let http = self
            .client
            .get(self.endpoint(CHECK_TOKEN_PATH))
            .query(&[("token", token)]);
        let body: CheckTokenResponse = self.fetch(http, token).await?;
        Ok(body.is_exist)
    }

    async fn send_stats_event(&self, request: &StatsEventRequest) -> Result<(), ApiError> {
        let sent = self
            .client
            .post(self.endpoint(STATS_EVENT_PATH))
            .json(request)
            .send()
            .await;

        check_status(sent, &request.suffix).map(|_| ())
    }
}
