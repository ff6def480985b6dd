//! Query and path parameter parsing for inbound links.
//!
//! When the inbound URI carries an `original-url` query parameter (set by
//! redirect pages that bounce through a custom scheme), parameters are read
//! from that URL instead of the inbound one.

use crate::domain::entities::{LinkUri, PathParams};
use std::borrow::Cow;
use std::collections::HashMap;

/// Query key carrying the URL the user originally opened.
pub const ORIGINAL_URL_KEY: &str = "original-url";

/// Returns the URL carried in `original-url`, if present and non-empty.
pub fn original_url(uri: &LinkUri) -> Option<&str> {
    uri.query_param(ORIGINAL_URL_KEY)
        .filter(|value| !value.trim().is_empty())
}

/// The URI parameters are read from: the `original-url` target when it
/// parses, otherwise the inbound URI itself.
pub fn effective_uri(uri: &LinkUri) -> Cow<'_, LinkUri> {
    match original_url(uri).map(LinkUri::parse) {
        Some(Ok(original)) => Cow::Owned(original),
        Some(Err(e)) => {
            tracing::debug!(error = %e, "Ignoring unparseable original-url parameter");
            Cow::Borrowed(uri)
        }
        None => Cow::Borrowed(uri),
    }
}

/// Decoded query parameters of the effective URI.
pub fn parse_query_params(uri: &LinkUri) -> HashMap<String, String> {
    effective_uri(uri).query_pairs().iter().cloned().collect()
}

/// Path parameters of the effective URI.
///
/// The first segment is the route marker (`link`), the second the main path
/// and the third, if any, the sub path. `main_path` is empty when absent.
pub fn parse_path_params(uri: &LinkUri) -> PathParams {
    let mut segments = effective_uri(uri).path_segments().into_iter().skip(1);
    let main_path = segments.next().unwrap_or_default();
    let sub_path = segments.next();
    PathParams::new(main_path, sub_path)
}
