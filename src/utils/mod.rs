//! Pure, synchronous helpers for link recognition and parsing.
//!
//! Nothing here performs I/O, and nothing here returns an error to the
//! caller: a miss is `None` or [`crate::domain::entities::ClassifiedLink::NotALink`].
//!
//! - [`link_classifier`] - Link variant classification
//! - [`referrer_extractor`] - Attribution URL and token extraction from install referrers
//! - [`link_params`] - Query and path parameters of inbound links

pub mod link_classifier;
pub mod link_params;
pub mod referrer_extractor;
