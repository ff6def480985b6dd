//! HTTP client for the remote lookup and stats service.

pub mod http_link_repository;

pub use http_link_repository::HttpLinkRepository;
