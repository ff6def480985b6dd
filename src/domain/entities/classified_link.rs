//! Link variant produced by classification.

/// The shape an inbound URI was recognized as.
///
/// Exactly one variant applies per [`super::LinkUri`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedLink {
    /// `https://{suffix}.{root}/link/{link_suffix}`
    Subdomain { suffix: String, link_suffix: String },

    /// A link on the fixed legacy host, resolved by subdomain + path.
    Legacy { subdomain: String, path: String },

    /// Anything else. Silently ignored by the orchestrator.
    NotALink,
}

impl ClassifiedLink {
    /// Returns true for every variant except [`ClassifiedLink::NotALink`].
    pub fn is_link(&self) -> bool {
        !matches!(self, Self::NotALink)
    }

    /// The identifier used to look the link up remotely, if any.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::Subdomain { link_suffix, .. } => Some(link_suffix),
            Self::Legacy { path, .. } => Some(path),
            Self::NotALink => None,
        }
    }
}
