//! Error types shared across the resolution pipeline.
//!
//! - [`ApiError`] - failures of the remote lookup / stats service
//! - [`ResolveError`] - failures of [`crate::application::services::ResolverService`]
//! - [`LinkError`] - the code + message pair delivered to listeners

use serde::Serialize;

/// Code used for failures that carry no HTTP status.
pub const UNCATEGORIZED_CODE: i32 = -1;

/// Errors returned by the remote link service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Link not found: {0}")]
    NotFound(String),

    #[error("Link service responded with HTTP {status}")]
    Http { status: u16 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ApiError {
    /// Listener-visible code: the HTTP status when there is one, `-1` otherwise.
    pub fn code(&self) -> i32 {
        match self {
            Self::NotFound(_) => 404,
            Self::Http { status } => i32::from(*status),
            Self::Transport(_) | Self::MalformedResponse(_) => UNCATEGORIZED_CODE,
        }
    }
}

/// Errors that can occur while resolving a classified link.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("URI is not a resolvable link")]
    NotALink,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ResolveError {
    pub fn code(&self) -> i32 {
        match self {
            Self::NotALink => UNCATEGORIZED_CODE,
            Self::Api(e) => e.code(),
        }
    }
}

/// Error notification delivered to [`crate::domain::listener::LinkListener::on_link_error`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkError {
    pub code: i32,
    pub message: String,
}

impl LinkError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// An error with the uncategorized `-1` code.
    pub fn uncategorized(message: impl Into<String>) -> Self {
        Self::new(UNCATEGORIZED_CODE, message)
    }
}

impl From<&ResolveError> for LinkError {
    fn from(e: &ResolveError) -> Self {
        Self::new(e.code(), e.to_string())
    }
}

impl From<ResolveError> for LinkError {
    fn from(e: ResolveError) -> Self {
        Self::from(&e)
    }
}

impl std::fmt::Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_codes() {
        assert_eq!(ApiError::NotFound("x".to_string()).code(), 404);
        assert_eq!(ApiError::Http { status: 503 }.code(), 503);
        assert_eq!(ApiError::Transport("timeout".to_string()).code(), -1);
        assert_eq!(ApiError::MalformedResponse("eof".to_string()).code(), -1);
    }

    #[test]
    fn test_resolve_error_code_passthrough() {
        let err = ResolveError::from(ApiError::Http { status: 500 });
        assert_eq!(err.code(), 500);
        assert_eq!(ResolveError::NotALink.code(), UNCATEGORIZED_CODE);
    }

    #[test]
    fn test_link_error_from_resolve_error() {
        let err = LinkError::from(ResolveError::from(ApiError::NotFound("notfound".to_string())));

        assert_eq!(err.code, 404);
        assert!(err.message.contains("notfound"));
    }

    #[test]
    fn test_link_error_display() {
        assert_eq!(
            LinkError::uncategorized("boom").to_string(),
            "[-1] boom"
        );
    }
}
