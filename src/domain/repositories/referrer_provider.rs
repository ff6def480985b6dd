//! Access to the platform install-referrer service.

use crate::domain::entities::ReferrerDetails;
use async_trait::async_trait;

/// Errors reported by the install-referrer service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferrerError {
    #[error("Install referrer API not supported")]
    NotSupported,

    #[error("Install referrer service unavailable")]
    Unavailable,

    #[error("Install referrer service disconnected")]
    Disconnected,

    #[error("Install referrer error: {0}")]
    Other(String),
}

/// Source of the install referrer string and its timestamps.
///
/// Queried by the deferred check once the first-launch flag was consumed, and
/// on demand by the referrer token lookup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferrerProvider: Send + Sync {
    /// Fetches the referrer recorded by the platform for this install.
    ///
    /// # Errors
    ///
    /// Returns [`ReferrerError`] when the platform service cannot answer.
    async fn install_referrer(&self) -> Result<ReferrerDetails, ReferrerError>;
}
