//! Domain layer containing link entities and collaborator contracts.
//!
//! This module defines the value types of the resolution engine and the
//! traits it relies on, independent of HTTP, storage or platform concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Per-request value types
//! - [`repositories`] - Collaborator trait definitions
//! - [`listener`] - Listener trait and registry
//! - [`stats_event`] - Stats reporting event model
//!
//! # Stats Processing Flow
//!
//! 1. A link result is delivered to listeners
//! 2. [`stats_event::StatsEvent`] is sent to an async channel
//! 3. [`crate::application::stats_worker::run_stats_worker`] posts it once
//! 4. Failures are logged and dropped

pub mod entities;
pub mod listener;
pub mod repositories;
pub mod stats_event;
