//! # LimeLink
//!
//! Deep link resolution and install-referrer attribution for LimeLink short
//! links.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Link entities, listener contract and collaborator traits
//! - **Application Layer** ([`application`]) - Resolution, first-launch tracking, stats and the [`Orchestrator`]
//! - **Infrastructure Layer** ([`infrastructure`]) - HTTP lookup client, flag stores, referrer providers
//! - **Utilities** ([`utils`]) - Pure link classification and referrer parsing
//!
//! ## Features
//!
//! - Subdomain (`https://{suffix}.limelink.org/link/{id}`) and legacy
//!   (`https://deep.limelink.org/{path}`) link recognition
//! - Remote resolution of links to in-app navigation targets
//! - Deferred deep links recovered from the install referrer on first launch
//! - Exactly-once first-launch tracking
//! - Fire-and-forget stats reporting
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use limelink::prelude::*;
//!
//! struct Navigator;
//!
//! impl LinkListener for Navigator {
//!     fn on_link_received(&self, result: &ResolutionResult) {
//!         println!("navigate to {:?}", result.resolved_target());
//!     }
//! }
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::builder("your-api-key").build()?;
//! let sdk = Orchestrator::connect(
//!     config,
//!     Arc::new(FileFlagStore::new("/var/lib/myapp")),
//!     Arc::new(StaticReferrerProvider::unsupported()),
//! )?;
//! sdk.add_link_listener(Arc::new(Navigator));
//!
//! if let Some(task) = sdk.check_deferred() {
//!     task.await;
//! }
//! if let Some(task) = sdk.handle_link("https://abc.limelink.org/link/abc123") {
//!     task.await;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See [`config::Config`] for available options.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod telemetry;
pub mod utils;

pub mod config;

pub use application::services::Orchestrator;
pub use error::{LinkError, ResolveError};

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{Collaborators, LinkTask, Orchestrator};
    pub use crate::config::{Config, ConfigError};
    pub use crate::domain::entities::{
        AttributionRecord, ClassifiedLink, EventType, LinkUri, PathParams, ReferrerCandidate,
        ReferrerDetails, ResolutionResult, TokenLink,
    };
    pub use crate::domain::listener::LinkListener;
    pub use crate::domain::repositories::{FlagStore, LinkRepository, ReferrerProvider};
    pub use crate::error::{ApiError, LinkError, ResolveError};
    pub use crate::infrastructure::http::HttpLinkRepository;
    pub use crate::infrastructure::referrer::StaticReferrerProvider;
    pub use crate::infrastructure::storage::{FileFlagStore, MemoryFlagStore};
}
