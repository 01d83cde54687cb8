//! Redis Cache - A typed cache client over Redis
//!
//! Provides a JSON-encoding client for Redis strings, hashes, lists, sets
//! and sorted sets, an in-memory store with the same semantics, and a small
//! HTTP service built on top of them.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod tasks;

pub use api::AppState;
pub use cache::CacheClient;
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
