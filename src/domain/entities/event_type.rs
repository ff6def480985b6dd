//! Stats event type.

use serde::Serialize;
use std::fmt;

/// Whether a stats event was reported on the first launch after install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    FirstRun,
    Rerun,
}

impl EventType {
    /// Maps the first-launch flag to an event type.
    pub fn from_first_launch(first_launch: bool) -> Self {
        if first_launch {
            Self::FirstRun
        } else {
            Self::Rerun
        }
    }

    /// Wire value sent to the stats endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstRun => "first_run",
            Self::Rerun => "rerun",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values() {
        assert_eq!(EventType::FirstRun.as_str(), "first_run");
        assert_eq!(EventType::Rerun.as_str(), "rerun");
    }

    #[test]
    fn test_serialize_matches_wire_value() {
        assert_eq!(
            serde_json::to_string(&EventType::FirstRun).unwrap(),
            "\"first_run\""
        );
        assert_eq!(serde_json::to_string(&EventType::Rerun).unwrap(), "\"rerun\"");
    }

    #[test]
    fn test_from_first_launch() {
        assert_eq!(EventType::from_first_launch(true), EventType::FirstRun);
        assert_eq!(EventType::from_first_launch(false), EventType::Rerun);
    }
}
