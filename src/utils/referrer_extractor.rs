//! Extraction of attribution links and tokens from install referrer strings.
//!
//! Referrers arrive in loosely structured shapes: plain `key=value&key=value`
//! pairs where one value is a URL, the same with the URL percent-encoded
//! (including its own query string), or free text containing a URL. Every
//! failure here degrades to "no candidate"; nothing is propagated.

use crate::domain::entities::{CandidateSource, ReferrerCandidate};
use crate::utils::link_classifier::DEFAULT_ROOT_DOMAIN;
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

/// Default query key for [`extract_token`].
pub const DEFAULT_TOKEN_KEY: &str = "token";

/// `http(s)://` followed by anything up to whitespace or `&`.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://[^\s&]+").unwrap());

/// Finds the first link URL hosted on the root domain inside a referrer.
///
/// # Strategy
///
/// 1. **Structured split**: split the raw string on `&`; for each segment try
///    the whole segment, then the part after the first `=`. Each candidate is
///    percent-decoded on its own, so an encoded `%26` inside a value survives
///    the split and the embedded query string is kept intact.
/// 2. **Pattern fallback**: percent-decode the whole string once and scan it
///    for `http(s)://` URLs.
///
/// The first candidate whose host is the root domain or one of its subdomains
/// wins, strategy 1 before strategy 2, left to right within each.
#[derive(Debug, Clone)]
pub struct ReferrerExtractor {
    root_domain: String,
    subdomain_marker: String,
}

impl ReferrerExtractor {
    pub fn new(root_domain: impl Into<String>) -> Self {
        let root_domain = root_domain.into().to_ascii_lowercase();
        Self {
            subdomain_marker: format!(".{}", root_domain),
            root_domain,
        }
    }

    /// Extracts the attribution link with its query string broken out.
    pub fn extract(&self, referrer: &str) -> Option<ReferrerCandidate> {
        if referrer.trim().is_empty() {
            return None;
        }

        let (matched, source) = match self.find_structured(referrer) {
            Some(url) => (url, CandidateSource::Decoded),
            None => (self.find_by_pattern(referrer)?, CandidateSource::Pattern),
        };

        let Some(candidate) = build_candidate(referrer, matched, source) else {
            tracing::debug!("Referrer candidate could not be re-parsed");
            return None;
        };
        Some(candidate)
    }

    /// Convenience returning only the candidate's full URL.
    pub fn extract_link_url(&self, referrer: &str) -> Option<String> {
        self.extract(referrer).map(|candidate| candidate.full_url)
    }

    fn find_structured(&self, referrer: &str) -> Option<String> {
        for segment in referrer.split('&') {
            let value = segment.split_once('=').map(|(_, value)| value);

            for candidate in std::iter::once(segment).chain(value) {
                if candidate.trim().is_empty() {
                    continue;
                }
                let Some(decoded) = decode_component(candidate) else {
                    continue;
                };
                if self.is_link_url(&decoded) {
                    return Some(decoded);
                }
            }
        }
        None
    }

    fn find_by_pattern(&self, referrer: &str) -> Option<String> {
        let decoded = decode_component(referrer)?;
        URL_PATTERN
            .find_iter(&decoded)
            .map(|m| m.as_str())
            .find(|candidate| self.is_link_url(candidate))
            .map(str::to_string)
    }

    fn is_link_url(&self, candidate: &str) -> bool {
        parse_http_url(candidate)
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
            .is_some_and(|host| host == self.root_domain || host.ends_with(&self.subdomain_marker))
    }
}

impl Default for ReferrerExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_DOMAIN)
    }
}

/// Extracts a bare attribution token from a referrer.
///
/// Reads `key` as a query parameter when the referrer parses as a URI,
/// otherwise falls back to case-insensitive `key=value` then `key:value`
/// patterns over the raw (not decoded) string. The key only matches as a whole
/// word at the start of the string or after `&`, `?`, `;`, `,` or whitespace.
pub fn extract_token(referrer: &str, key: &str) -> Option<String> {
    if referrer.trim().is_empty() || key.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(referrer)
        && let Some((_, value)) = url.query_pairs().find(|(k, _)| k == key)
        && !value.trim().is_empty()
    {
        return Some(value.into_owned());
    }

    // The key must start the string or follow a separator, so `promocode=`
    // never yields a `code` token.
    let escaped = regex::escape(key);
    for pattern in [
        format!(r"(?i)(?:^|[&?;,\s]){}=([^&\s]+)", escaped),
        format!(r"(?i)(?:^|[&?;,\s]){}:([^&\s]+)", escaped),
    ] {
        let Ok(regex) = Regex::new(&pattern) else {
            continue;
        };
        if let Some(captures) = regex.captures(referrer) {
            return Some(captures[1].to_string());
        }
    }

    None
}

fn build_candidate(
    referrer: &str,
    matched: String,
    source: CandidateSource,
) -> Option<ReferrerCandidate> {
    let parsed = parse_http_url(&matched)?;

    let mut base = parsed.clone();
    base.set_query(None);

    let query_params: HashMap<String, String> = parsed.query_pairs().into_owned().collect();

    Some(ReferrerCandidate {
        referrer: referrer.to_string(),
        url: base.to_string(),
        query_string: parsed.query().map(str::to_string),
        full_url: matched,
        query_params,
        source,
    })
}

fn parse_http_url(candidate: &str) -> Option<Url> {
    Url::parse(candidate)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
}

/// Form-style percent decoding: `+` becomes a space, `%XX` its byte.
///
/// Returns `None` for a malformed escape or invalid UTF-8.
fn decode_component(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let well_formed = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !well_formed {
                return None;
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

    fn extractor() -> ReferrerExtractor {
        ReferrerExtractor::default()
    }

    #[test]
    fn test_extract_plain_value() {
        let referrer = "utm_source=google&url=https://abc.limelink.org/abc123&utm_medium=cpc";
        let candidate = extractor().extract(referrer).unwrap();

        assert_eq!(candidate.full_url, "https://abc.limelink.org/abc123");
        assert_eq!(candidate.url, "https://abc.limelink.org/abc123");
        assert!(candidate.query_string.is_none());
        assert!(candidate.query_params.is_empty());
        assert_eq!(candidate.referrer, referrer);
        assert_eq!(candidate.source, CandidateSource::Decoded);
    }

    #[test]
    fn test_extract_encoded_value_preserves_query() {
        let referrer = "utm_source=google&url=https%3A%2F%2Fabc.limelink.org%2Flink%2Ftest%3Fkey1%3Dval1%26key2%3Dval2&utm_medium=cpc";
        let candidate = extractor().extract(referrer).unwrap();

        assert_eq!(
            candidate.full_url,
            "https://abc.limelink.org/link/test?key1=val1&key2=val2"
        );
        assert_eq!(candidate.url, "https://abc.limelink.org/link/test");
        assert_eq!(candidate.query_string.as_deref(), Some("key1=val1&key2=val2"));
        assert_eq!(
            candidate.query_params,
            HashMap::from([
                ("key1".to_string(), "val1".to_string()),
                ("key2".to_string(), "val2".to_string()),
            ])
        );
    }

    #[test]
    fn test_extract_reencoded_query_yields_same_params() {
        let referrer = "utm_source=google&url=https%3A%2F%2Fabc.limelink.org%2Flink%2Ftest%3Fkey1%3Dval1%26key2%3Dval2&utm_medium=cpc";
        let first = extractor().extract(referrer).unwrap();

        let reencoded = format!(
            "utm_source=google&url={}&utm_medium=cpc",
            utf8_percent_encode(&first.full_url, NON_ALPHANUMERIC)
        );
        let second = extractor().extract(&reencoded).unwrap();

        assert_eq!(second.full_url, first.full_url);
        assert_eq!(second.query_params, first.query_params);
    }

    #[test]
    fn test_extract_unencoded_query_keeps_first_param() {
        let referrer = "utm_source=google&url=https://abc.limelink.org/link/test?key1=val1&utm_medium=cpc";
        let candidate = extractor().extract(referrer).unwrap();

        assert_eq!(candidate.full_url, "https://abc.limelink.org/link/test?key1=val1");
        assert_eq!(candidate.url, "https://abc.limelink.org/link/test");
        assert_eq!(
            candidate.query_params,
            HashMap::from([("key1".to_string(), "val1".to_string())])
        );
    }

    #[test]
    fn test_extract_bare_url() {
        let referrer = "https://abc.limelink.org/link/test?key1=val1";
        let candidate = extractor().extract(referrer).unwrap();

        assert_eq!(candidate.full_url, referrer);
        assert_eq!(candidate.url, "https://abc.limelink.org/link/test");
        assert_eq!(candidate.query_string.as_deref(), Some("key1=val1"));
    }

    #[test]
    fn test_extract_fully_encoded_referrer() {
        let referrer = "url%3Dhttps%3A%2F%2Ftest.limelink.org%2Flink%2Fxyz%26utm_source%3Dgoogle";
        let candidate = extractor().extract(referrer).unwrap();

        assert_eq!(candidate.full_url, "https://test.limelink.org/link/xyz");
        assert_eq!(candidate.source, CandidateSource::Pattern);
    }

    #[test]
    fn test_extract_from_free_text() {
        let candidate = extractor()
            .extract("campaign: https://abc.limelink.org/link/x launch")
            .unwrap();

        assert_eq!(candidate.full_url, "https://abc.limelink.org/link/x");
        assert_eq!(candidate.source, CandidateSource::Pattern);
    }

    #[test]
    fn test_extract_http_and_bare_root() {
        assert_eq!(
            extractor().extract_link_url("source=test&url=http://sub.limelink.org/test&other=val"),
            Some("http://sub.limelink.org/test".to_string())
        );
        assert_eq!(
            extractor().extract_link_url("url=https://limelink.org/page"),
            Some("https://limelink.org/page".to_string())
        );
    }

    #[test]
    fn test_extract_first_match_wins() {
        let referrer = "a=https://first.limelink.org/one&b=https://second.limelink.org/two";
        assert_eq!(
            extractor().extract_link_url(referrer),
            Some("https://first.limelink.org/one".to_string())
        );
    }

    #[test]
    fn test_extract_structured_beats_pattern() {
        // The free-text URL comes first, but the split strategy runs first.
        let referrer = "note https://text.limelink.org/a&url=https%3A%2F%2Fsplit.limelink.org%2Fb";
        assert_eq!(
            extractor().extract_link_url(referrer),
            Some("https://split.limelink.org/b".to_string())
        );
    }

    #[test]
    fn test_extract_rejects_other_domains() {
        assert!(extractor().extract("utm_source=google&url=https://example.com").is_none());
        assert!(extractor().extract("url=https://notlimelink.org/page").is_none());
        assert!(
            extractor()
                .extract("url=https://limelink.org.evil.com/page")
                .is_none()
        );
    }

    #[test]
    fn test_extract_blank_input() {
        assert!(extractor().extract("").is_none());
        assert!(extractor().extract("   ").is_none());
    }

    #[test]
    fn test_extract_malformed_escape_is_skipped() {
        assert!(extractor().extract("url=https%3A%2F%2Fabc.limelink.org%2Fx%zz").is_none());
        assert_eq!(
            extractor().extract_link_url("bad=%zz&url=https://abc.limelink.org/ok"),
            Some("https://abc.limelink.org/ok".to_string())
        );
    }

    #[test]
    fn test_extract_custom_root_domain() {
        let extractor = ReferrerExtractor::new("example.io");
        assert_eq!(
            extractor.extract_link_url("url=https://go.example.io/x"),
            Some("https://go.example.io/x".to_string())
        );
        assert!(extractor.extract("url=https://abc.limelink.org/x").is_none());
    }

    #[test]
    fn test_extract_token_from_uri_query() {
        assert_eq!(
            extract_token("https://play.example.com/store?id=app&token=abc123", "token"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_extract_token_from_pairs() {
        assert_eq!(
            extract_token("utm_source=google&token=xyz789&utm_medium=cpc", DEFAULT_TOKEN_KEY),
            Some("xyz789".to_string())
        );
    }

    #[test]
    fn test_extract_token_colon_and_case_insensitive() {
        assert_eq!(
            extract_token("campaign TOKEN:q42 end", "token"),
            Some("q42".to_string())
        );
    }

    #[test]
    fn test_extract_token_custom_key() {
        assert_eq!(
            extract_token("code=summer&full_request_url=x", "code"),
            Some("summer".to_string())
        );
    }

    #[test]
    fn test_extract_token_requires_whole_key() {
        assert!(extract_token("utm_source=google&promocode=SPRING", "code").is_none());
        assert!(extract_token("url=https://abc.limelink.org/landing?promocode=SPRING", "code").is_none());
        assert!(extract_token("barcode:123", "code").is_none());
        assert_eq!(
            extract_token("promocode=SPRING&code=real", "code"),
            Some("real".to_string())
        );
        assert_eq!(
            extract_token("landing?code=abc", "code"),
            Some("abc".to_string())
        );
    }

    #[test]
    fn test_extract_token_missing() {
        assert!(extract_token("utm_source=google", "token").is_none());
        assert!(extract_token("", "token").is_none());
        assert!(extract_token("token=abc", "").is_none());
    }

    #[test]
    fn test_decode_component() {
        assert_eq!(decode_component("a%20b+c").as_deref(), Some("a b c"));
        assert!(decode_component("%2").is_none());
        assert!(decode_component("%G1").is_none());
        assert!(decode_component("%FF").is_none());
    }
}
