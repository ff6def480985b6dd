//! Resolution result delivered to link listeners.

use super::referrer::AttributionRecord;
use serde::Serialize;
use std::collections::HashMap;

/// Path parameters of a link: `/link/{main_path}/{sub_path}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PathParams {
    /// The attribution "suffix". Empty when the link carries none.
    pub main_path: String,
    /// Optional "handle".
    pub sub_path: Option<String>,
}

impl PathParams {
    pub fn new(main_path: impl Into<String>, sub_path: Option<String>) -> Self {
        Self {
            main_path: main_path.into(),
            sub_path,
        }
    }
}

/// Outcome of resolving an inbound link or a deferred attribution.
///
/// A deferred result always carries its [`AttributionRecord`]; the
/// constructors are the only way to build one, so that holds by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionResult {
    original_url: String,
    resolved_target: Option<String>,
    query_params: HashMap<String, String>,
    path_params: PathParams,
    is_deferred: bool,
    attribution: Option<AttributionRecord>,
}

impl ResolutionResult {
    /// A result for a link opened directly by the user.
    pub fn direct(
        original_url: impl Into<String>,
        resolved_target: Option<String>,
        query_params: HashMap<String, String>,
        path_params: PathParams,
    ) -> Self {
        Self {
            original_url: original_url.into(),
            resolved_target,
            query_params,
            path_params,
            is_deferred: false,
            attribution: None,
        }
    }

    /// A result recovered from the install referrer on first launch.
    pub fn deferred(
        original_url: impl Into<String>,
        resolved_target: Option<String>,
        query_params: HashMap<String, String>,
        path_params: PathParams,
        attribution: AttributionRecord,
    ) -> Self {
        Self {
            original_url: original_url.into(),
            resolved_target,
            query_params,
            path_params,
            is_deferred: true,
            attribution: Some(attribution),
        }
    }

    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    /// The in-app navigation target, e.g. `myapp://product/123`.
    pub fn resolved_target(&self) -> Option<&str> {
        self.resolved_target.as_deref()
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    pub fn is_deferred(&self) -> bool {
        self.is_deferred
    }

    pub fn attribution(&self) -> Option<&AttributionRecord> {
        self.attribution.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ReferrerDetails;

    #[test]
    fn test_direct_result() {
        let result = ResolutionResult::direct(
            "https://abc.limelink.org/link/abc123",
            Some("myapp://product/123".to_string()),
            HashMap::new(),
            PathParams::new("abc123", None),
        );

        assert_eq!(result.resolved_target(), Some("myapp://product/123"));
        assert!(!result.is_deferred());
        assert!(result.attribution().is_none());
    }

    #[test]
    fn test_deferred_result_carries_attribution() {
        let attribution =
            AttributionRecord::new(ReferrerDetails::new("url=https://a.limelink.org/x", 1, 2), None);
        let result = ResolutionResult::deferred(
            "https://a.limelink.org/x",
            Some("https://a.limelink.org/x".to_string()),
            HashMap::new(),
            PathParams::default(),
            attribution,
        );

        assert!(result.is_deferred());
        assert!(result.attribution().is_some());
    }

    #[test]
    fn test_serialize_shape() {
        let result = ResolutionResult::direct(
            "https://abc.limelink.org/link/abc123",
            None,
            HashMap::new(),
            PathParams::new("abc123", Some("h".to_string())),
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["is_deferred"], false);
        assert_eq!(json["path_params"]["main_path"], "abc123");
        assert_eq!(json["path_params"]["sub_path"], "h");
        assert!(json["resolved_target"].is_null());
    }
}
