//! Cache Entry Module
//!
//! Defines the shape-tagged value held under a key and its expiry metadata.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::cache::Shape;

// == Stored Value ==
/// The value held under one key. A key holds exactly one shape at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Str(String),
    Hash(HashMap<String, String>),
    List(VecDeque<String>),
    Set(HashSet<String>),
    /// member -> score
    SortedSet(HashMap<String, f64>),
}

impl StoredValue {
    /// Returns the shape tag of this value.
    pub fn shape(&self) -> Shape {
        match self {
            StoredValue::Str(_) => Shape::String,
            StoredValue::Hash(_) => Shape::Hash,
            StoredValue::List(_) => Shape::List,
            StoredValue::Set(_) => Shape::Set,
            StoredValue::SortedSet(_) => Shape::SortedSet,
        }
    }

    /// True for a collection with no elements left. Such keys are removed.
    pub fn is_empty_collection(&self) -> bool {
        match self {
            StoredValue::Str(_) => false,
            StoredValue::Hash(h) => h.is_empty(),
            StoredValue::List(l) => l.is_empty(),
            StoredValue::Set(s) => s.is_empty(),
            StoredValue::SortedSet(z) => z.is_empty(),
        }
    }
}

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: StoredValue,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry without expiry.
    pub fn new(value: StoredValue) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Creates a new cache entry expiring after `ttl_ms` milliseconds.
    pub fn with_ttl_ms(value: StoredValue, ttl_ms: Option<u64>) -> Self {
        Self {
            value,
            expires_at: ttl_ms.map(|ttl| current_timestamp_ms().saturating_add(ttl)),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// its expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired (TTL elapsed)
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
