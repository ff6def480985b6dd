//! Fire-and-forget stats reporting service.

use std::sync::Arc;

use crate::application::services::LaunchTracker;
use crate::domain::entities::EventType;
use crate::domain::repositories::{FlagStore, LinkRepository};
use crate::domain::stats_event::{StatsEvent, StatsEventRequest};

/// Outcome of a single [`StatsService::report`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The event had no suffix; nothing was sent and the flag was not read.
    Skipped,
    /// The event was posted.
    Sent(EventType),
    /// The post failed; the failure was logged.
    Failed(EventType),
}

/// Reports link opens to the stats endpoint.
///
/// The event type is decided at the moment of reporting from the shared
/// [`LaunchTracker`]: `first_run` if this report consumed the first-launch
/// flag, `rerun` otherwise. Reports are sent once; failures are logged and
/// never propagated or retried.
pub struct StatsService<R: LinkRepository + ?Sized, S: FlagStore + ?Sized> {
    repository: Arc<R>,
    tracker: Arc<LaunchTracker<S>>,
    api_key: String,
    platform: String,
}

impl<R: LinkRepository + ?Sized, S: FlagStore + ?Sized> StatsService<R, S> {
    /// Creates a new stats service.
    pub fn new(
        repository: Arc<R>,
        tracker: Arc<LaunchTracker<S>>,
        api_key: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            tracker,
            api_key: api_key.into(),
            platform: platform.into(),
        }
    }

    /// Builds the request body for an event.
    pub fn build_request(&self, event: &StatsEvent, event_type: EventType) -> StatsEventRequest {
        StatsEventRequest {
            private_key: self.api_key.clone(),
            suffix: event.suffix.clone(),
            handle: event.handle.clone(),
            event_type,
            operating_system: self.platform.clone(),
        }
    }

    /// Reports one event.
    ///
    /// Events without a suffix are skipped before the first-launch flag is
    /// touched, so they never consume it.
    pub async fn report(&self, event: StatsEvent) -> ReportOutcome {
        if !event.is_reportable() {
            tracing::debug!("Skipping stats event without suffix");
            return ReportOutcome::Skipped;
        }

        let event_type = EventType::from_first_launch(self.tracker.check_and_consume());
        let request = self.build_request(&event, event_type);

        match self.repository.send_stats_event(&request).await {
            Ok(()) => {
                tracing::debug!(
                    suffix = %request.suffix,
                    event_type = %event_type,
                    "Stats event sent"
                );
                ReportOutcome::Sent(event_type)
            }
            Err(e) => {
                tracing::warn!(
                    suffix = %request.suffix,
                    event_type = %event_type,
                    error = %e,
                    "Failed to send stats event"
                );
                ReportOutcome::Failed(event_type)
            }
        }
    }
}
