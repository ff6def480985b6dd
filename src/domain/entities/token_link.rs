//! Deferred link registered under a token.

use serde::Serialize;
use std::collections::HashMap;

/// A deferred deep link looked up by the token carried in an install referrer.
///
/// Unlike a [`crate::domain::entities::ResolutionResult`], a token link has no
/// single navigation target: the host decides what to do with the parameters
/// and the store URLs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TokenLink {
    pub token: String,
    /// Free-form parameters attached to the link.
    pub parameters: HashMap<String, serde_json::Value>,
    pub ios_app_store_url: Option<String>,
    pub android_play_store_url: Option<String>,
    pub fallback_url: Option<String>,
}

impl TokenLink {
    /// Store URL for `platform` (`ios` or anything else for Android), falling
    /// back to the fallback URL.
    pub fn store_url(&self, platform: &str) -> Option<&str> {
        let store = if platform.eq_ignore_ascii_case("ios") {
            &self.ios_app_store_url
        } else {
            &self.android_play_store_url
        };
        store.as_deref().or(self.fallback_url.as_deref())
    }

    /// A parameter rendered as a string. Non-string values use their JSON form.
    pub fn parameter(&self, key: &str) -> Option<String> {
        self.parameters.get(key).map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn link() -> TokenLink {
        TokenLink {
            token: "t1".to_string(),
            parameters: HashMap::from([
                ("screen".to_string(), json!("product")),
                ("id".to_string(), json!(42)),
            ]),
            ios_app_store_url: Some("https://apps.apple.com/app/id1".to_string()),
            android_play_store_url: None,
            fallback_url: Some("https://limelink.org/fallback".to_string()),
        }
    }

    #[test]
    fn test_store_url_per_platform() {
        let link = link();
        assert_eq!(link.store_url("iOS"), Some("https://apps.apple.com/app/id1"));
        assert_eq!(link.store_url("android"), Some("https://limelink.org/fallback"));
    }

    #[test]
    fn test_parameter_rendering() {
        let link = link();
        assert_eq!(link.parameter("screen").as_deref(), Some("product"));
        assert_eq!(link.parameter("id").as_deref(), Some("42"));
        assert!(link.parameter("missing").is_none());
    }
}
