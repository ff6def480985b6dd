//! Application layer services implementing the resolution pipeline.
//!
//! Services consume the collaborator traits from
//! [`crate::domain::repositories`] and are composed by the
//! [`services::Orchestrator`], the SDK's public entry point.
//!
//! # Available Services
//!
//! - [`services::resolver_service::ResolverService`] - Remote link lookup
//! - [`services::launch_tracker::LaunchTracker`] - Exactly-once first-launch flag
//! - [`services::stats_service::StatsService`] - Fire-and-forget stats reporting
//! - [`services::orchestrator::Orchestrator`] - Classify, resolve, attribute, deliver
//!
//! [`stats_worker`] drains the stats queue in the background.

pub mod services;
pub mod stats_worker;
