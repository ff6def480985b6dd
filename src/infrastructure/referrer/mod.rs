//! [`crate::domain::repositories::ReferrerProvider`] implementations.

pub mod static_referrer_provider;

pub use static_referrer_provider::StaticReferrerProvider;
