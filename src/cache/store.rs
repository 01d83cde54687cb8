//! Store Module
//!
//! The connection seam between the cache client and the key-value store.
//! Implementations speak the store's command families in terms of raw
//! string keys and encoded payloads; the client adds validation and
//! (de)serialization on top.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;

use crate::error::Result;

// == Shape ==
/// The kind of value a key holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    String,
    Hash,
    List,
    Set,
    SortedSet,
}

impl Shape {
    /// Parses the name reported by the `TYPE` command.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Shape::String),
            "hash" => Some(Shape::Hash),
            "list" => Some(Shape::List),
            "set" => Some(Shape::Set),
            "zset" => Some(Shape::SortedSet),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Shape::String => "string",
            Shape::Hash => "hash",
            Shape::List => "list",
            Shape::Set => "set",
            Shape::SortedSet => "zset",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

// == Store Trait ==
/// A connection to a key-value store.
///
/// Each method is a single store command. Atomicity of multi-step
/// operations (set-if-absent, increments, swaps, moves) is the store's
/// responsibility. Collections emptied by a removal stop existing.
#[async_trait]
pub trait Store: Send + Sync {
    /// Round-trip check of the connection.
    async fn ping(&self) -> Result<()>;

    // -- keys --
    async fn exists(&self, key: &str) -> Result<bool>;
    async fn del(&self, keys: &[String]) -> Result<u64>;
    /// Relative expiry in milliseconds. False if the key is absent.
    async fn pexpire(&self, key: &str, ttl_ms: i64) -> Result<bool>;
    /// Absolute expiry as Unix milliseconds. False if the key is absent.
    async fn pexpire_at(&self, key: &str, at_ms: i64) -> Result<bool>;
    async fn persist(&self, key: &str) -> Result<bool>;
    /// Remaining TTL in milliseconds, -1 without TTL, -2 when absent.
    async fn pttl(&self, key: &str) -> Result<i64>;
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;
    async fn shape(&self, key: &str) -> Result<Option<Shape>>;

    // -- scalars --
    async fn get(&self, key: &str) -> Result<Option<String>>;
    /// Overwrites any value and TTL.
    async fn set(&self, key: &str, value: String, ttl_ms: Option<u64>) -> Result<()>;
    async fn set_nx(&self, key: &str, value: String, ttl_ms: Option<u64>) -> Result<bool>;
    async fn get_set(&self, key: &str, value: String) -> Result<Option<String>>;
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>>;
    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64>;
    async fn append(&self, key: &str, value: &str) -> Result<u64>;

    // -- hashes --
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>>;
    async fn hset(&self, key: &str, field: &str, value: String) -> Result<()>;
    async fn hexists(&self, key: &str, field: &str) -> Result<bool>;
    async fn hdel(&self, key: &str, fields: &[String]) -> Result<u64>;
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>>;
    async fn hmset(&self, key: &str, items: Vec<(String, String)>) -> Result<()>;
    async fn hmget(&self, key: &str, fields: &[String]) -> Result<Vec<Option<String>>>;
    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64>;

    // -- lists --
    async fn lpush(&self, key: &str, values: Vec<String>) -> Result<u64>;
    async fn rpush(&self, key: &str, values: Vec<String>) -> Result<u64>;
    async fn lpop(&self, key: &str) -> Result<Option<String>>;
    async fn rpop(&self, key: &str) -> Result<Option<String>>;
    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>>;
    async fn ltrim(&self, key: &str, start: i64, stop: i64) -> Result<()>;
    async fn lindex(&self, key: &str, index: i64) -> Result<Option<String>>;
    async fn llen(&self, key: &str) -> Result<u64>;

    // -- sets --
    async fn sadd(&self, key: &str, members: Vec<String>) -> Result<u64>;
    async fn scard(&self, key: &str) -> Result<u64>;
    async fn sismember(&self, key: &str, member: &str) -> Result<bool>;
    async fn srandmember(&self, key: &str) -> Result<Option<String>>;
    /// Positive `count` returns distinct members, negative allows repeats
    /// and always returns `|count|` members of a non-empty set.
    async fn srandmember_count(&self, key: &str, count: i64) -> Result<Vec<String>>;
    async fn spop(&self, key: &str) -> Result<Option<String>>;
    async fn smembers(&self, key: &str) -> Result<Vec<String>>;
    async fn srem(&self, key: &str, members: &[String]) -> Result<u64>;
    async fn smove(&self, src: &str, dst: &str, member: &str) -> Result<bool>;
    async fn sunion(&self, keys: &[String]) -> Result<Vec<String>>;

    // -- sorted sets --
    /// True when the member was newly added.
    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<bool>;
    async fn zrem(&self, key: &str, members: &[String]) -> Result<u64>;
    async fn zcard(&self, key: &str) -> Result<u64>;
    async fn zincr_by(&self, key: &str, delta: f64, member: &str) -> Result<f64>;
    async fn zcount(&self, key: &str, min: f64, max: f64) -> Result<u64>;
    async fn zrank(&self, key: &str, member: &str) -> Result<Option<u64>>;
    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>>;
    async fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>>;
    async fn zrevrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>>;
    async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> Result<Vec<String>>;
    /// Note the argument order: `max` comes first.
    async fn zrevrange_by_score(&self, key: &str, max: f64, min: f64) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_type_names() {
        for shape in [
            Shape::String,
            Shape::Hash,
            Shape::List,
            Shape::Set,
            Shape::SortedSet,
        ] {
            assert_eq!(Shape::from_type_name(shape.type_name()), Some(shape));
        }
        assert_eq!(Shape::from_type_name("none"), None);
        assert_eq!(Shape::SortedSet.to_string(), "zset");
    }
}
