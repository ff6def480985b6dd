//! Infrastructure layer for external integrations.
//!
//! This layer implements the collaborator traits defined by the domain layer.
//!
//! # Modules
//!
//! - [`http`] - Remote lookup and stats service client (reqwest)
//! - [`storage`] - First-launch flag stores (in-memory and JSON file)
//! - [`referrer`] - Install-referrer providers for hosts without a platform service

pub mod http;
pub mod referrer;
pub mod storage;
