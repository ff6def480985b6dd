//! Stats event model for fire-and-forget reporting.

use crate::domain::entities::{EventType, PathParams};
use serde::Serialize;
use serde_with::skip_serializing_none;

/// An in-memory stats event queued after a link was delivered.
///
/// Passed from the orchestrator to the stats worker via a channel so that
/// reporting never blocks listener delivery. The [`EventType`] is not part of
/// the event: it is decided by the worker at the moment of reporting.
///
/// # Usage Flow
///
/// 1. Created by the orchestrator from the delivered link's path parameters
/// 2. Sent to channel (non-blocking, dropped when the queue is full)
/// 3. Processed by [`crate::application::stats_worker::run_stats_worker`]
/// 4. Converted to a [`StatsEventRequest`] and posted once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsEvent {
    pub suffix: String,
    pub handle: Option<String>,
}

impl StatsEvent {
    /// Creates a stats event for a link's main path and optional sub path.
    pub fn new(suffix: impl Into<String>, handle: Option<String>) -> Self {
        Self {
            suffix: suffix.into(),
            handle,
        }
    }

    /// Returns false when there is no suffix to attribute the event to.
    pub fn is_reportable(&self) -> bool {
        !self.suffix.is_empty()
    }
}

impl From<PathParams> for StatsEvent {
    fn from(params: PathParams) -> Self {
        Self::new(params.main_path, params.sub_path)
    }
}

/// Body of `POST /api/v1/stats/event`.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsEventRequest {
    pub private_key: String,
    pub suffix: String,
    pub handle: Option<String>,
    pub event_type: EventType,
    pub operating_system: String,
}
