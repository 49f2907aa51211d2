#![forbid(unsafe_code)]

//! Mirrors one YouTube channel into a self-hosted page.
//!
//! The catalog is cached in a Gist (and optionally a local file) so the
//! rate-limited Data API is only queried when the cache is empty or stale.

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod mirror;
pub mod render;
pub mod server;
pub mod store;
pub mod youtube;

#[cfg(test)]
pub(crate) mod testing;
