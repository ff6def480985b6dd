//! Classification of inbound URIs into link variants.

use crate::domain::entities::{ClassifiedLink, LinkUri};
use regex::Regex;
use std::sync::LazyLock;

/// Root domain hosting subdomain-style links.
pub const DEFAULT_ROOT_DOMAIN: &str = "limelink.org";

/// Host of legacy deeplinks.
pub const DEFAULT_LEGACY_HOST: &str = "deep.limelink.org";

/// `/link/{rest}`, rest taken greedily to the end of the path.
static LINK_PATH_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)^/link/(.+)$").unwrap());

/// Pure, total classifier for inbound URIs.
///
/// # Rules
///
/// 1. **Scheme**: must be `https`
/// 2. **Subdomain host** (`{suffix}.{root}`): path must match `/link/{rest}`
/// 3. **Legacy host**: any path
/// 4. Everything else is [`ClassifiedLink::NotALink`]
///
/// Paths are matched after percent-decoding, so the captured link suffix and
/// legacy path are the decoded values the lookup service expects.
///
/// The bare root domain never classifies as a link, whatever its path, so the
/// service's own website is never intercepted. A subdomain host whose path
/// misses rule 2 is only accepted if it is the legacy host itself.
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    root_domain: String,
    subdomain_marker: String,
    legacy_host: String,
}

impl LinkClassifier {
    pub fn new(root_domain: impl Into<String>, legacy_host: impl Into<String>) -> Self {
        let root_domain = root_domain.into().to_ascii_lowercase();
        Self {
            subdomain_marker: format!(".{}", root_domain),
            root_domain,
            legacy_host: legacy_host.into().to_ascii_lowercase(),
        }
    }

    pub fn root_domain(&self) -> &str {
        &self.root_domain
    }

    pub fn legacy_host(&self) -> &str {
        &self.legacy_host
    }

    /// Determines the link variant of a URI.
    pub fn classify(&self, uri: &LinkUri) -> ClassifiedLink {
        if uri.scheme() != "https" {
            return ClassifiedLink::NotALink;
        }

        let Some(host) = uri.host().map(str::to_ascii_lowercase) else {
            return ClassifiedLink::NotALink;
        };

        let path = uri.decoded_path();

        if let Some(suffix) = host.strip_suffix(&self.subdomain_marker)
            && !suffix.is_empty()
            && let Some(captures) = LINK_PATH_REGEX.captures(&path)
        {
            return ClassifiedLink::Subdomain {
                suffix: suffix.to_string(),
                link_suffix: captures[1].to_string(),
            };
        }

        if host == self.legacy_host {
            let subdomain = host.split('.').next().unwrap_or_default().to_string();
            return ClassifiedLink::Legacy { subdomain, path };
        }

        ClassifiedLink::NotALink
    }

    /// Cheap pre-check on scheme and host only; the path is not inspected.
    pub fn is_universal_link(&self, uri: &LinkUri) -> bool {
        if uri.scheme() != "https" {
            return false;
        }
        uri.host().is_some_and(|host| {
            let host = host.to_ascii_lowercase();
            host == self.legacy_host
                || host
                    .strip_suffix(&self.subdomain_marker)
                    .is_some_and(|suffix| !suffix.is_empty())
        })
    }

    /// Returns true for the root domain itself or any of its subdomains.
    pub fn is_link_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        host == self.root_domain || host.ends_with(&self.subdomain_marker)
    }
}

impl Default for LinkClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_DOMAIN, DEFAULT_LEGACY_HOST)
    }
}
