//! Business logic services for the application layer.

pub mod launch_tracker;
pub mod orchestrator;
pub mod resolver_service;
pub mod stats_service;

pub use launch_tracker::LaunchTracker;
pub use orchestrator::{Collaborators, LinkTask, Orchestrator};
pub use resolver_service::ResolverService;
pub use stats_service::{ReportOutcome, StatsService};
