//! Inbound link URI entity.

use url::Url;

/// Errors that can occur while parsing an inbound link.
#[derive(Debug, thiserror::Error)]
pub enum LinkUriError {
    #[error("Invalid link format: {0}")]
    InvalidFormat(String),

    #[error("Link is empty")]
    Empty,
}

/// An inbound URI as delivered by the host (e.g. the data of a view intent).
///
/// Immutable once constructed. Query keys are unique: when the raw string
/// repeats a key, the first occurrence wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkUri {
    raw: String,
    scheme: String,
    host: Option<String>,
    path: String,
    query: Vec<(String, String)>,
}

impl LinkUri {
    /// Parses a raw URI string.
    ///
    /// # Errors
    ///
    /// Returns [`LinkUriError::Empty`] for blank input and
    /// [`LinkUriError::InvalidFormat`] when the string is not an absolute URI.
    pub fn parse(input: &str) -> Result<Self, LinkUriError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(LinkUriError::Empty);
        }

        let url = Url::parse(trimmed).map_err(|e| LinkUriError::InvalidFormat(e.to_string()))?;

        let mut query: Vec<(String, String)> = Vec::new();
        for (key, value) in url.query_pairs() {
            if !query.iter().any(|(k, _)| *k == key) {
                query.push((key.into_owned(), value.into_owned()));
            }
        }

        Ok(Self {
            raw: trimmed.to_string(),
            scheme: url.scheme().to_string(),
            host: url.host_str().map(str::to_string),
            path: url.path().to_string(),
            query,
        })
    }

    /// Builds a URI from its parts.
    ///
    /// The raw form is reassembled as `scheme://host/path?query`.
    pub fn new(
        scheme: impl Into<String>,
        host: impl Into<String>,
        path: impl Into<String>,
        query: Vec<(String, String)>,
    ) -> Self {
        let scheme = scheme.into();
        let host = host.into().to_ascii_lowercase();
        let path = path.into();

        let mut unique: Vec<(String, String)> = Vec::with_capacity(query.len());
        for (key, value) in query {
            if !unique.iter().any(|(k, _)| *k == key) {
                unique.push((key, value));
            }
        }

        let mut raw = format!("{}://{}{}", scheme, host, path);
        if !unique.is_empty() {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(unique.iter())
                .finish();
            raw.push('?');
            raw.push_str(&encoded);
        }

        Self {
            raw,
            scheme,
            host: Some(host),
            path,
            query: unique,
        }
    }

    /// The raw string this URI was built from. Used for deduplication.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// The path as it appears in the URI, still percent-encoded.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path with percent escapes decoded. Invalid UTF-8 is replaced.
    pub fn decoded_path(&self) -> String {
        percent_encoding::percent_decode_str(&self.path)
            .decode_utf8_lossy()
            .into_owned()
    }

    /// Ordered, key-unique query pairs (decoded).
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Returns the decoded value of a query parameter.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Non-empty, percent-decoded path segments.
    pub fn path_segments(&self) -> Vec<String> {
        self.path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                percent_encoding::percent_decode_str(segment)
                    .decode_utf8_lossy()
                    .into_owned()
            })
            .collect()
    }
}

impl std::fmt::Display for LinkUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subdomain_link() {
        let uri = LinkUri::parse("https://abc.limelink.org/link/xyz?ref=test").unwrap();

        assert_eq!(uri.scheme(), "https");
        assert_eq!(uri.host(), Some("abc.limelink.org"));
        assert_eq!(uri.path(), "/link/xyz");
        assert_eq!(uri.query_param("ref"), Some("test"));
        assert_eq!(uri.as_str(), "https://abc.limelink.org/link/xyz?ref=test");
    }

    #[test]
    fn test_parse_lowercases_host() {
        let uri = LinkUri::parse("https://ABC.LimeLink.org/link/xyz").unwrap();
        assert_eq!(uri.host(), Some("abc.limelink.org"));
    }

    #[test]
    fn test_parse_duplicate_query_key_first_wins() {
        let uri = LinkUri::parse("https://a.limelink.org/link/x?k=1&k=2&j=3").unwrap();

        assert_eq!(uri.query_pairs().len(), 2);
        assert_eq!(uri.query_param("k"), Some("1"));
        assert_eq!(uri.query_param("j"), Some("3"));
    }

    #[test]
    fn test_parse_custom_scheme() {
        let uri = LinkUri::parse("myapp://product/123").unwrap();

        assert_eq!(uri.scheme(), "myapp");
        assert_eq!(uri.host(), Some("product"));
        assert_eq!(uri.path(), "/123");
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(LinkUri::parse("   "), Err(LinkUriError::Empty)));
    }

    #[test]
    fn test_parse_relative_is_invalid() {
        assert!(matches!(
            LinkUri::parse("/link/xyz"),
            Err(LinkUriError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_new_assembles_raw() {
        let uri = LinkUri::new(
            "https",
            "Sub.limelink.org",
            "/link/x",
            vec![("a".to_string(), "1 2".to_string())],
        );

        assert_eq!(uri.host(), Some("sub.limelink.org"));
        assert_eq!(uri.as_str(), "https://sub.limelink.org/link/x?a=1+2");
    }

    #[test]
    fn test_path_segments_decoded() {
        let uri = LinkUri::parse("https://a.limelink.org/link/hello%20world/sub").unwrap();
        assert_eq!(
            uri.path_segments(),
            vec!["link".to_string(), "hello world".to_string(), "sub".to_string()]
        );
    }

    #[test]
    fn test_decoded_path_keeps_raw_path_encoded() {
        let uri = LinkUri::parse("https://a.limelink.org/link/%ED%95%9C%EA%B8%80").unwrap();

        assert_eq!(uri.path(), "/link/%ED%95%9C%EA%B8%80");
        assert_eq!(uri.decoded_path(), "/link/한글");
    }
}
