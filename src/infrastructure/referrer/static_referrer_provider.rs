//! Referrer provider returning a fixed answer.

use async_trait::async_trait;

use crate::domain::entities::ReferrerDetails;
use crate::domain::repositories::{ReferrerError, ReferrerProvider};

/// Install-referrer provider with a fixed answer.
///
/// Hosts outside the platform store (the CLI, tests, server-side replays)
/// supply the referrer string they already have.
#[derive(Debug, Clone)]
pub struct StaticReferrerProvider {
    answer: Result<ReferrerDetails, ReferrerError>,
}

impl StaticReferrerProvider {
    pub fn new(details: ReferrerDetails) -> Self {
        Self {
            answer: Ok(details),
        }
    }

    /// A provider for a bare referrer string with zero timestamps.
    pub fn from_referrer(referrer_url: impl Into<String>) -> Self {
        Self::new(ReferrerDetails::new(referrer_url, 0, 0))
    }

    /// A provider whose every call fails with `error`.
    pub fn failing(error: ReferrerError) -> Self {
        Self { answer: Err(error) }
    }

    /// A provider for hosts without an install-referrer service.
    pub fn unsupported() -> Self {
        Self::failing(ReferrerError::NotSupported)
    }
}

#[async_trait]
impl ReferrerProvider for StaticReferrerProvider {
    async fn install_referrer(&self) -> Result<ReferrerDetails, ReferrerError> {
        self.answer.clone()
    }
}
