//! Core domain entities representing the link resolution data model.
//!
//! Entities are plain value types created per request. None of them perform
//! I/O; classification, extraction and resolution live in [`crate::utils`] and
//! [`crate::application::services`].
//!
//! # Entity Types
//!
//! - [`LinkUri`] - An inbound URI with ordered, key-unique query pairs
//! - [`ClassifiedLink`] - The link variant a URI was recognized as
//! - [`ReferrerCandidate`] - A link URL recovered from an install referrer
//! - [`AttributionRecord`] - Referrer details attached to a deferred result
//! - [`ResolutionResult`] - What listeners receive
//! - [`EventType`] - First run vs. rerun for stats reporting
//! - [`TokenLink`] - A deferred link registered under a referrer token

pub mod classified_link;
pub mod event_type;
pub mod link_uri;
pub mod referrer;
pub mod resolution;
pub mod token_link;

pub use classified_link::ClassifiedLink;
pub use event_type::EventType;
pub use link_uri::{LinkUri, LinkUriError};
pub use referrer::{AttributionRecord, CandidateSource, ReferrerCandidate, ReferrerDetails};
pub use resolution::{PathParams, ResolutionResult};
pub use token_link::TokenLink;
