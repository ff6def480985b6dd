//! Collaborator traits for the domain layer.
//!
//! These traits abstract everything the resolution engine does not own: the
//! remote link service, the persisted first-launch flag and the platform
//! install-referrer service. Concrete implementations live in
//! `crate::infrastructure`.
//!
//! # Architecture
//!
//! - Traits define the contract for external operations
//! - Mock implementations are auto-generated via `mockall` for testing
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Remote link lookup and stats reporting
//! - [`FlagStore`] - Single-key boolean persistence
//! - [`ReferrerProvider`] - Install referrer retrieval

pub mod flag_store;
pub mod link_repository;
pub mod referrer_provider;

pub use flag_store::{FIRST_LAUNCH_KEY, FlagStore, PREFS_NAMESPACE, StoreError};
pub use link_repository::{
    DeferredLinkRequest, DynamicLinkRequest, LegacyLinkRequest, LinkRepository, SETUP_EVENT_TYPE,
};
pub use referrer_provider::{ReferrerError, ReferrerProvider};

#[cfg(test)]
pub use flag_store::MockFlagStore;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use referrer_provider::MockReferrerProvider;
