//! Install-referrer payloads and the attribution derived from them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// How a [`ReferrerCandidate`] was located inside the raw referrer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Found by splitting on `&` and percent-decoding a single segment.
    Decoded,
    /// Found by decoding the whole string and scanning for an `http(s)://` URL.
    Pattern,
}

/// A link URL recovered from a noisy referrer string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferrerCandidate {
    /// The raw referrer string the candidate was extracted from.
    pub referrer: String,
    /// Candidate URL without its query string.
    pub url: String,
    /// Candidate URL as matched, including its query string.
    pub full_url: String,
    /// Raw query string of the candidate (`None` when it has none).
    pub query_string: Option<String>,
    /// Decoded query parameters of the candidate.
    pub query_params: HashMap<String, String>,
    pub source: CandidateSource,
}

/// Raw response of the platform install-referrer service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferrerDetails {
    pub referrer_url: String,
    /// Seconds since epoch when the store listing was clicked.
    pub click_timestamp: i64,
    /// Seconds since epoch when the install began.
    pub install_timestamp: i64,
}

impl ReferrerDetails {
    pub fn new(referrer_url: impl Into<String>, click_timestamp: i64, install_timestamp: i64) -> Self {
        Self {
            referrer_url: referrer_url.into(),
            click_timestamp,
            install_timestamp,
        }
    }
}

/// Attribution attached to a deferred [`super::ResolutionResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributionRecord {
    pub referrer_url: String,
    pub click_timestamp: i64,
    pub install_timestamp: i64,
    pub resolved_link: Option<ReferrerCandidate>,
}

impl AttributionRecord {
    /// Combines platform referrer details with the extracted candidate.
    pub fn new(details: ReferrerDetails, resolved_link: Option<ReferrerCandidate>) -> Self {
        Self {
            referrer_url: details.referrer_url,
            click_timestamp: details.click_timestamp,
            install_timestamp: details.install_timestamp,
            resolved_link,
        }
    }

    /// Click time as a UTC timestamp. `None` when the platform reported 0.
    pub fn clicked_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.click_timestamp)
    }

    /// Install time as a UTC timestamp. `None` when the platform reported 0.
    pub fn installed_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.install_timestamp)
    }
}

fn timestamp(seconds: i64) -> Option<DateTime<Utc>> {
    if seconds <= 0 {
        return None;
    }
    DateTime::from_timestamp(seconds, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribution_from_details() {
        let details = ReferrerDetails::new("utm_source=google", 1_700_000_000, 1_700_000_100);
        let record = AttributionRecord::new(details, None);

        assert_eq!(record.referrer_url, "utm_source=google");
        assert_eq!(record.click_timestamp, 1_700_000_000);
        assert_eq!(record.install_timestamp, 1_700_000_100);
        assert!(record.resolved_link.is_none());
    }

    #[test]
    fn test_attribution_timestamps() {
        let record = AttributionRecord::new(ReferrerDetails::new("r", 1_700_000_000, 0), None);

        assert_eq!(record.clicked_at().unwrap().timestamp(), 1_700_000_000);
        assert!(record.installed_at().is_none());
    }
}
