//! User Service
//!
//! String read/write operations backing the `/user/:key` endpoints.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::cache::CacheClient;
use crate::error::Result;

/// Reads and writes user-facing string values through the cache client.
#[derive(Clone)]
pub struct UserService {
    cache: CacheClient,
}

impl UserService {
    pub fn new(cache: CacheClient) -> Self {
        Self { cache }
    }

    /// Reads the value stored at `key`, if any.
    pub async fn get_string(&self, key: &str) -> Result<Option<Value>> {
        self.cache.get(key).await
    }

    /// Stores `value` at `key` for `ttl` unless the key already holds a value.
    ///
    /// Returns false when an existing value was left in place.
    pub async fn set_string<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<bool> {
        let stored = self.cache.set_if_absent(key, value, Some(ttl)).await?;
        info!(key, stored, ttl_ms = ttl.as_millis() as u64, "set_string");
        Ok(stored)
    }
}

/// Renders a lookup result as the plain-text line returned by `GET /user/:key`.
///
/// JSON strings are shown without quotes, other values as compact JSON and
/// a missing value as `null`.
pub fn describe_value(key: &str, value: Option<&Value>) -> String {
    let rendered = match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "null".to_string(),
    };
    format!("{key} maps to String={rendered}")
}
