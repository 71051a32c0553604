//! Monitoring dashboard and API contract checker for a cross-exchange
//! arbitrage engine.
//!
//! The library holds everything the binaries share: wire models, the
//! degrading HTTP client, the mapping layer that turns raw payloads into
//! display rows, the refresh-generation cache, the endpoint contract
//! tables, and the TUI itself.

pub mod cache;
pub mod client;
pub mod config;
pub mod contract;
pub mod feed;
pub mod mapping;
pub mod mock;
pub mod models;
pub mod tui;

pub use cache::RefreshCache;
pub use client::{ApiClient, FetchResult};
