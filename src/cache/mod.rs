//! Cache Module
//!
//! Typed cache client over five value shapes (string, hash, list, set,
//! sorted set), the store seam it talks through, and two stores: Redis and
//! an in-process one.

mod client;
mod entry;
mod expiry;
mod memory;
mod redis_store;
mod store;


// Re-export public types
pub use client::CacheClient;
pub use entry::{CacheEntry, StoredValue};
pub use expiry::{TimeUnit, TTL_KEY_MISSING, TTL_PERSISTENT};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::{Shape, Store};
