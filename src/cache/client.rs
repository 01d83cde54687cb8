//! Cache Client Module
//!
//! Typed façade over a [`Store`]. Every operation validates its arguments
//! before touching the store, encodes values as JSON on the way in and
//! decodes them on the way out. Store errors are passed through unchanged.
//!
//! Argument policy: an empty key, hash field or key pattern is always an
//! `InvalidArgument` error, whatever the operation. A key that simply does
//! not exist is not an error: reads return `None`, `false`, `0` or an empty
//! collection. An empty list and an absent list are indistinguishable.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::expiry::duration_ms;
use crate::cache::{RedisStore, Shape, Store, TimeUnit};
use crate::error::{CacheError, Result};

// == Argument Checks ==

fn check_key(op: &'static str, key: &str) -> Result<()> {
    if key.is_empty() {
        warn!("{op}: rejected empty key");
        return Err(CacheError::invalid(op, "key must not be empty"));
    }
    debug!("{op} {key}");
    Ok(())
}

fn check_field(op: &'static str, field: &str) -> Result<()> {
    if field.is_empty() {
        warn!("{op}: rejected empty hash field");
        return Err(CacheError::invalid(op, "field must not be empty"));
    }
    Ok(())
}

fn owned_keys<K: AsRef<str>>(op: &'static str, keys: &[K]) -> Result<Vec<String>> {
    keys.iter()
        .map(|k| {
            let k = k.as_ref();
            check_key(op, k).map(|_| k.to_string())
        })
        .collect()
}

fn owned_fields<F: AsRef<str>>(op: &'static str, fields: &[F]) -> Result<Vec<String>> {
    fields
        .iter()
        .map(|f| {
            let f = f.as_ref();
            check_field(op, f).map(|_| f.to_string())
        })
        .collect()
}

fn ttl_ms(op: &'static str, ttl: Duration) -> Result<u64> {
    match u64::try_from(ttl.as_millis()) {
        Ok(0) => Err(CacheError::invalid(op, "ttl must be at least one millisecond")),
        Ok(ms) => Ok(ms),
        Err(_) => Err(CacheError::invalid(op, "ttl out of range")),
    }
}

// == Codec ==

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn encode_all<T: Serialize>(values: &[T]) -> Result<Vec<String>> {
    values.iter().map(|v| encode(v)).collect()
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T> {
    Ok(serde_json::from_str(raw)?)
}

fn decode_opt<T: DeserializeOwned>(raw: Option<String>) -> Result<Option<T>> {
    raw.as_deref().map(decode).transpose()
}

fn decode_all<T: DeserializeOwned>(raw: Vec<String>) -> Result<Vec<T>> {
    raw.iter().map(|r| decode(r)).collect()
}

fn decode_each<T: DeserializeOwned>(raw: Vec<Option<String>>) -> Result<Vec<Option<T>>> {
    raw.into_iter().map(decode_opt).collect()
}

// == Cache Client ==
/// Typed cache client over a shared store connection.
///
/// Cheap to clone; every clone talks to the same store. The client keeps no
/// per-call state and takes no locks: atomic operations (`set_if_absent`,
/// increments, `get_set`, `s_move`, `z_incr_by`) are single store commands.
#[derive(Clone)]
pub struct CacheClient {
    store: Arc<dyn Store>,
}

impl CacheClient {
    // == Constructors ==
    /// Creates a client over an already opened store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Opens a Redis connection at `url` and wraps it.
    pub async fn connect(url: &str) -> Result<Self> {
        let store = RedisStore::connect(url).await?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Checks that the store answers.
    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }

    // =========================================================================
    // KEY OPERATIONS
    // =========================================================================

    pub async fn has_key(&self, key: &str) -> Result<bool> {
        check_key("has_key", key)?;
        self.store.exists(key).await
    }

    /// Deletes one key. Returns true if it existed.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        check_key("delete", key)?;
        Ok(self.store.del(&[key.to_string()]).await? > 0)
    }

    /// Deletes several keys. Returns how many existed.
    pub async fn delete_many<K: AsRef<str>>(&self, keys: &[K]) -> Result<u64> {
        let keys = owned_keys("delete_many", keys)?;
        if keys.is_empty() {
            return Ok(0);
        }
        self.store.del(&keys).await
    }

    /// Sets a relative expiry. A zero duration deletes the key.
    /// Returns false if the key does not exist.
    pub async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        check_key("expire", key)?;
        self.store.pexpire(key, duration_ms(ttl)).await
    }

    /// Sets an absolute expiry. A deadline in the past deletes the key.
    /// Returns false if the key does not exist.
    pub async fn expire_at(&self, key: &str, at: DateTime<Utc>) -> Result<bool> {
        check_key("expire_at", key)?;
        self.store.pexpire_at(key, at.timestamp_millis()).await
    }

    /// Removes the expiry of a key. Returns true if one was removed.
    pub async fn persist(&self, key: &str) -> Result<bool> {
        check_key("persist", key)?;
        self.store.persist(key).await
    }

    /// Remaining time to live in `unit`, truncated.
    ///
    /// Returns [`TTL_KEY_MISSING`](crate::cache::TTL_KEY_MISSING) (-2) for an
    /// absent key and [`TTL_PERSISTENT`](crate::cache::TTL_PERSISTENT) (-1)
    /// for a key without expiry.
    pub async fn get_expire(&self, key: &str, unit: TimeUnit) -> Result<i64> {
        check_key("get_expire", key)?;
        let ttl = self.store.pttl(key).await?;
        let remaining = unit.from_millis(ttl);
        debug!("get_expire {key}: {remaining}{unit}");
        Ok(remaining)
    }

    /// Keys matching a glob pattern (`*`, `?`, `[abc]`, `[^abc]`), sorted.
    ///
    /// Scans the whole keyspace; meant for diagnostics, not hot paths.
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        if pattern.is_empty() {
            warn!("keys: rejected empty pattern");
            return Err(CacheError::invalid("keys", "pattern must not be empty"));
        }
        self.store.keys(pattern).await
    }

    /// Shape of the value held at `key`, `None` if absent.
    pub async fn shape(&self, key: &str) -> Result<Option<Shape>> {
        check_key("shape", key)?;
        self.store.shape(key).await
    }

    // =========================================================================
    // SCALAR OPERATIONS
    // =========================================================================

    /// Stores a value without expiry, replacing any previous value and TTL.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        check_key("set", key)?;
        self.store.set(key, encode(value)?, None).await
    }

    /// Stores a value that expires after `ttl`.
    pub async fn set_with_ttl<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        check_key("set_with_ttl", key)?;
        let ms = ttl_ms("set_with_ttl", ttl)?;
        self.store.set(key, encode(value)?, Some(ms)).await
    }

    /// Stores a value only if the key is absent. Returns whether it was stored.
    pub async fn set_if_absent<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<bool> {
        check_key("set_if_absent", key)?;
        let ms = ttl.map(|t| ttl_ms("set_if_absent", t)).transpose()?;
        self.store.set_nx(key, encode(value)?, ms).await
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        check_key("get", key)?;
        decode_opt(self.store.get(key).await?)
    }

    /// Stored text without JSON decoding, e.g. after [`append`](Self::append).
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        check_key("get_raw", key)?;
        self.store.get(key).await
    }

    /// Replaces the value and returns the previous one. Clears any TTL.
    pub async fn get_set<T, V>(&self, key: &str, value: &V) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        V: Serialize + ?Sized,
    {
        check_key("get_set", key)?;
        decode_opt(self.store.get_set(key, encode(value)?).await?)
    }

    /// Values for several keys, positionally. Absent keys and keys holding
    /// other shapes yield `None`.
    pub async fn mget<T: DeserializeOwned, K: AsRef<str>>(
        &self,
        keys: &[K],
    ) -> Result<Vec<Option<T>>> {
        let keys = owned_keys("mget", keys)?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        decode_each(self.store.mget(&keys).await?)
    }

    /// Atomically adds `delta` to an integer value; an absent key counts as 0.
    pub async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        check_key("incr_by", key)?;
        self.store.incr_by(key, delta).await
    }

    /// Atomically subtracts `delta` from an integer value.
    pub async fn decr_by(&self, key: &str, delta: i64) -> Result<i64> {
        check_key("decr_by", key)?;
        let delta = delta
            .checked_neg()
            .ok_or_else(|| CacheError::invalid("decr_by", "delta out of range"))?;
        self.store.incr_by(key, delta).await
    }

    /// Appends raw text (not JSON) and returns the resulting length in bytes.
    pub async fn append(&self, key: &str, value: &str) -> Result<u64> {
        check_key("append", key)?;
        self.store.append(key, value).await
    }

    // =========================================================================
    // HASH OPERATIONS
    // =========================================================================

    pub async fn h_get<T: DeserializeOwned>(&self, key: &str, field: &str) -> Result<Option<T>> {
        check_key("h_get", key)?;
        check_field("h_get", field)?;
        decode_opt(self.store.hget(key, field).await?)
    }

    pub async fn h_set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        field: &str,
        value: &T,
    ) -> Result<()> {
        check_key("h_set", key)?;
        check_field("h_set", field)?;
        self.store.hset(key, field, encode(value)?).await
    }

    pub async fn h_exists(&self, key: &str, field: &str) -> Result<bool> {
        check_key("h_exists", key)?;
        check_field("h_exists", field)?;
        self.store.hexists(key, field).await
    }

    /// Removes fields. Returns how many existed.
    pub async fn h_del<F: AsRef<str>>(&self, key: &str, fields: &[F]) -> Result<u64> {
        check_key("h_del", key)?;
        let fields = owned_fields("h_del", fields)?;
        if fields.is_empty() {
            return Ok(0);
        }
        self.store.hdel(key, &fields).await
    }

    pub async fn h_get_all<T: DeserializeOwned>(&self, key: &str) -> Result<HashMap<String, T>> {
        check_key("h_get_all", key)?;
        self.store
            .hgetall(key)
            .await?
            .into_iter()
            .map(|(field, raw)| decode(&raw).map(|value| (field, value)))
            .collect()
    }

    /// Sets several fields at once. An empty map is a no-op.
    pub async fn h_mset<T: Serialize>(&self, key: &str, hash: &HashMap<String, T>) -> Result<()> {
        check_key("h_mset", key)?;
        if hash.is_empty() {
            return Ok(());
        }
        let items = hash
            .iter()
            .map(|(field, value)| -> Result<(String, String)> {
                check_field("h_mset", field)?;
                Ok((field.clone(), encode(value)?))
            })
            .collect::<Result<Vec<_>>>()?;
        self.store.hmset(key, items).await
    }

    /// Values of the given fields, positionally.
    pub async fn h_mget<T: DeserializeOwned, F: AsRef<str>>(
        &self,
        key: &str,
        fields: &[F],
    ) -> Result<Vec<Option<T>>> {
        check_key("h_mget", key)?;
        let fields = owned_fields("h_mget", fields)?;
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        decode_each(self.store.hmget(key, &fields).await?)
    }

    /// Atomically adds `delta` to an integer field; an absent field counts as 0.
    pub async fn h_incr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64> {
        check_key("h_incr_by", key)?;
        check_field("h_incr_by", field)?;
        self.store.hincr_by(key, field, delta).await
    }

    // =========================================================================
    // LIST OPERATIONS
    // =========================================================================

    /// Pushes values at the head, one after the other: the last value ends
    /// up first. Returns the list length.
    pub async fn l_push<T: Serialize>(&self, key: &str, values: &[T]) -> Result<u64> {
        check_key("l_push", key)?;
        if values.is_empty() {
            return Err(CacheError::invalid("l_push", "no values to push"));
        }
        self.store.lpush(key, encode_all(values)?).await
    }

    /// Pushes values at the tail. Returns the list length.
    pub async fn r_push<T: Serialize>(&self, key: &str, values: &[T]) -> Result<u64> {
        check_key("r_push", key)?;
        if values.is_empty() {
            return Err(CacheError::invalid("r_push", "no values to push"));
        }
        self.store.rpush(key, encode_all(values)?).await
    }

    pub async fn l_pop<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        check_key("l_pop", key)?;
        decode_opt(self.store.lpop(key).await?)
    }

    pub async fn r_pop<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        check_key("r_pop", key)?;
        decode_opt(self.store.rpop(key).await?)
    }

    /// Elements between `start` and `stop` inclusive; negative indices count
    /// from the tail (-1 is the last element).
    pub async fn l_range<T: DeserializeOwned>(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<T>> {
        check_key("l_range", key)?;
        decode_all(self.store.lrange(key, start, stop).await?)
    }

    /// Keeps only the elements between `start` and `stop` inclusive.
    pub async fn l_trim(&self, key: &str, start: i64, stop: i64) -> Result<()> {
        check_key("l_trim", key)?;
        self.store.ltrim(key, start, stop).await
    }

    /// Element at `index`; negative indices count from the tail.
    pub async fn l_index<T: DeserializeOwned>(&self, key: &str, index: i64) -> Result<Option<T>> {
        check_key("l_index", key)?;
        decode_opt(self.store.lindex(key, index).await?)
    }

    pub async fn l_len(&self, key: &str) -> Result<u64> {
        check_key("l_len", key)?;
        self.store.llen(key).await
    }

    // =========================================================================
    // SET OPERATIONS
    // =========================================================================

    /// Adds members. Returns how many were not already present.
    pub async fn s_add<T: Serialize>(&self, key: &str, members: &[T]) -> Result<u64> {
        check_key("s_add", key)?;
        if members.is_empty() {
            return Err(CacheError::invalid("s_add", "no members to add"));
        }
        self.store.sadd(key, encode_all(members)?).await
    }

    pub async fn s_card(&self, key: &str) -> Result<u64> {
        check_key("s_card", key)?;
        self.store.scard(key).await
    }

    pub async fn s_is_member<T: Serialize + ?Sized>(&self, key: &str, member: &T) -> Result<bool> {
        check_key("s_is_member", key)?;
        self.store.sismember(key, &encode(member)?).await
    }

    pub async fn s_random_member<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        check_key("s_random_member", key)?;
        decode_opt(self.store.srandmember(key).await?)
    }

    /// `count` random members, possibly repeated. A non-empty set always
    /// yields exactly `count` items, even when `count` exceeds its size.
    pub async fn s_random_members<T: DeserializeOwned>(
        &self,
        key: &str,
        count: usize,
    ) -> Result<Vec<T>> {
        check_key("s_random_members", key)?;
        if count == 0 {
            return Ok(Vec::new());
        }
        let count = i64::try_from(count)
            .map_err(|_| CacheError::invalid("s_random_members", "count out of range"))?;
        decode_all(self.store.srandmember_count(key, -count).await?)
    }

    /// Removes and returns a random member.
    pub async fn s_pop<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        check_key("s_pop", key)?;
        decode_opt(self.store.spop(key).await?)
    }

    pub async fn s_members<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        check_key("s_members", key)?;
        decode_all(self.store.smembers(key).await?)
    }

    /// Removes members. Returns how many were present.
    pub async fn s_rem<T: Serialize>(&self, key: &str, members: &[T]) -> Result<u64> {
        check_key("s_rem", key)?;
        if members.is_empty() {
            return Ok(0);
        }
        self.store.srem(key, &encode_all(members)?).await
    }

    /// Atomically moves `member` from `src` to `dst`. Returns false if it was
    /// not in `src`.
    pub async fn s_move<T: Serialize + ?Sized>(
        &self,
        src: &str,
        dst: &str,
        member: &T,
    ) -> Result<bool> {
        check_key("s_move", src)?;
        check_key("s_move", dst)?;
        self.store.smove(src, dst, &encode(member)?).await
    }

    /// Union of two sets.
    pub async fn s_union<T: DeserializeOwned>(&self, key: &str, other: &str) -> Result<Vec<T>> {
        check_key("s_union", key)?;
        check_key("s_union", other)?;
        decode_all(
            self.store
                .sunion(&[key.to_string(), other.to_string()])
                .await?,
        )
    }

    // =========================================================================
    // SORTED SET OPERATIONS
    // =========================================================================
    //
    // Members are compared in their JSON encoding, so ties on score are
    // broken by the encoded text.

    /// Adds a member or updates its score. Returns true if it was new.
    pub async fn z_add<T: Serialize + ?Sized>(
        &self,
        key: &str,
        score: f64,
        member: &T,
    ) -> Result<bool> {
        check_key("z_add", key)?;
        self.store.zadd(key, score, &encode(member)?).await
    }

    pub async fn z_rem<T: Serialize>(&self, key: &str, members: &[T]) -> Result<u64> {
        check_key("z_rem", key)?;
        if members.is_empty() {
            return Ok(0);
        }
        self.store.zrem(key, &encode_all(members)?).await
    }

    pub async fn z_card(&self, key: &str) -> Result<u64> {
        check_key("z_card", key)?;
        self.store.zcard(key).await
    }

    /// Atomically adds `delta` to a member's score; an absent member starts
    /// at 0. Returns the new score.
    pub async fn z_incr_by<T: Serialize + ?Sized>(
        &self,
        key: &str,
        delta: f64,
        member: &T,
    ) -> Result<f64> {
        check_key("z_incr_by", key)?;
        self.store.zincr_by(key, delta, &encode(member)?).await
    }

    /// Members with `min <= score <= max`.
    pub async fn z_count(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        check_key("z_count", key)?;
        self.store.zcount(key, min, max).await
    }

    /// 0-based position by ascending score, `None` if not a member.
    pub async fn z_rank<T: Serialize + ?Sized>(&self, key: &str, member: &T) -> Result<Option<u64>> {
        check_key("z_rank", key)?;
        self.store.zrank(key, &encode(member)?).await
    }

    pub async fn z_score<T: Serialize + ?Sized>(&self, key: &str, member: &T) -> Result<Option<f64>> {
        check_key("z_score", key)?;
        self.store.zscore(key, &encode(member)?).await
    }

    /// Members by ascending rank between `start` and `stop` inclusive.
    pub async fn z_range<T: DeserializeOwned>(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<T>> {
        check_key("z_range", key)?;
        decode_all(self.store.zrange(key, start, stop).await?)
    }

    /// Members by descending rank between `start` and `stop` inclusive.
    pub async fn z_reverse_range<T: DeserializeOwned>(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<T>> {
        check_key("z_reverse_range", key)?;
        decode_all(self.store.zrevrange(key, start, stop).await?)
    }

    /// Members with `min <= score <= max`, ascending.
    pub async fn z_range_by_score<T: DeserializeOwned>(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> Result<Vec<T>> {
        check_key("z_range_by_score", key)?;
        decode_all(self.store.zrange_by_score(key, min, max).await?)
    }

    /// Members with `min <= score <= max`, descending.
    ///
    /// **Argument order differs from [`z_range_by_score`](Self::z_range_by_score):
    /// `max` comes before `min`**, as in the `ZREVRANGEBYSCORE` command.
    /// Passing `(min, max)` here selects nothing.
    pub async fn z_reverse_range_by_score<T: DeserializeOwned>(
        &self,
        key: &str,
        max: f64,
        min: f64,
    ) -> Result<Vec<T>> {
        check_key("z_reverse_range_by_score", key)?;
        decode_all(self.store.zrevrange_by_score(key, max, min).await?)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStore, TTL_KEY_MISSING, TTL_PERSISTENT};
    use serde::Deserialize;

    fn client() -> CacheClient {
        CacheClient::new(Arc::new(MemoryStore::new()))
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    fn is_invalid<T: std::fmt::Debug>(result: Result<T>) -> bool {
        matches!(result, Err(CacheError::InvalidArgument(_)))
    }

    // == Keys ==

    #[tokio::test]
    async fn test_empty_key_is_rejected_everywhere() {
        let c = client();

        assert!(is_invalid(c.get::<String>("").await));
        assert!(is_invalid(c.set("", &1).await));
        assert!(is_invalid(c.has_key("").await));
        assert!(is_invalid(c.incr_by("", 1).await));
        assert!(is_invalid(c.get_expire("", TimeUnit::Seconds).await));
        assert!(is_invalid(c.append("", "x").await));
        assert!(is_invalid(c.h_incr_by("", "f", 1).await));
        assert!(is_invalid(c.h_incr_by("k", "", 1).await));
        assert!(is_invalid(c.z_incr_by("", 1.0, "m").await));
        assert!(is_invalid(c.l_len("").await));
        assert!(is_invalid(c.s_move("a", "", "m").await));
        assert!(is_invalid(c.delete_many(&["ok", ""]).await));
        assert!(is_invalid(c.keys("").await));
    }

    #[tokio::test]
    async fn test_delete_and_has_key() {
        let c = client();
        c.set("a", "1").await.unwrap();
        c.set("b", "2").await.unwrap();

        assert!(c.has_key("a").await.unwrap());
        assert!(c.delete("a").await.unwrap());
        assert!(!c.delete("a").await.unwrap());
        assert!(!c.has_key("a").await.unwrap());

        assert_eq!(c.delete_many(&["b", "missing"]).await.unwrap(), 1);
        assert_eq!(c.delete_many::<&str>(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_expire_sentinels() {
        let c = client();

        assert_eq!(
            c.get_expire("k", TimeUnit::Seconds).await.unwrap(),
            TTL_KEY_MISSING
        );

        c.set("k", "v").await.unwrap();
        assert_eq!(
            c.get_expire("k", TimeUnit::Seconds).await.unwrap(),
            TTL_PERSISTENT
        );

        assert!(c.expire("k", Duration::from_secs(10)).await.unwrap());
        let remaining = c.get_expire("k", TimeUnit::Seconds).await.unwrap();
        assert!((0..=10).contains(&remaining));

        assert!(c.persist("k").await.unwrap());
        assert_eq!(
            c.get_expire("k", TimeUnit::Seconds).await.unwrap(),
            TTL_PERSISTENT
        );
        assert!(!c.persist("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_expire_on_absent_key() {
        let c = client();
        assert!(!c.expire("nope", Duration::from_secs(5)).await.unwrap());
    }

    #[tokio::test]
    async fn test_expire_at() {
        let c = client();
        c.set("k", "v").await.unwrap();

        let deadline = Utc::now() + chrono::Duration::minutes(5);
        assert!(c.expire_at("k", deadline).await.unwrap());
        let minutes = c.get_expire("k", TimeUnit::Minutes).await.unwrap();
        assert!((4..=5).contains(&minutes));

        let past = Utc::now() - chrono::Duration::seconds(1);
        assert!(c.expire_at("k", past).await.unwrap());
        assert!(!c.has_key("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_keys_and_shape() {
        let c = client();
        c.set("user:1", "a").await.unwrap();
        c.h_set("user:2", "name", "b").await.unwrap();
        c.r_push("queue", &["x"]).await.unwrap();

        assert_eq!(c.keys("user:*").await.unwrap(), vec!["user:1", "user:2"]);
        assert_eq!(c.shape("user:1").await.unwrap(), Some(Shape::String));
        assert_eq!(c.shape("user:2").await.unwrap(), Some(Shape::Hash));
        assert_eq!(c.shape("queue").await.unwrap(), Some(Shape::List));
        assert_eq!(c.shape("none").await.unwrap(), None);
    }

    // == Scalars ==

    #[tokio::test]
    async fn test_set_get_structured_value() {
        let c = client();
        let p = Point { x: 3, y: -4 };
        c.set("p", &p).await.unwrap();

        assert_eq!(c.get::<Point>("p").await.unwrap(), Some(p));
        assert_eq!(c.get::<Point>("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_with_ttl() {
        let c = client();
        c.set_with_ttl("k", "v", Duration::from_secs(60))
            .await
            .unwrap();

        let ms = c.get_expire("k", TimeUnit::Milliseconds).await.unwrap();
        assert!(ms > 0 && ms <= 60_000);
        assert!(is_invalid(c.set_with_ttl("k", "v", Duration::ZERO).await));
    }

    #[tokio::test]
    async fn test_set_if_absent() {
        let c = client();
        let ttl = Some(Duration::from_secs(30));

        assert!(c.set_if_absent("k", "v1", ttl).await.unwrap());
        assert!(!c.set_if_absent("k", "v2", ttl).await.unwrap());
        assert_eq!(c.get::<String>("k").await.unwrap().as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_get_set() {
        let c = client();
        let previous: Option<String> = c.get_set("k", "first").await.unwrap();
        assert_eq!(previous, None);

        let previous: Option<String> = c.get_set("k", "second").await.unwrap();
        assert_eq!(previous.as_deref(), Some("first"));
        assert_eq!(c.get::<String>("k").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_mget() {
        let c = client();
        c.set("a", &1).await.unwrap();
        c.set("c", &3).await.unwrap();

        let values: Vec<Option<i32>> = c.mget(&["a", "b", "c"]).await.unwrap();
        assert_eq!(values, vec![Some(1), None, Some(3)]);
        assert!(c.mget::<i32, &str>(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_incr_decr_sequence() {
        let c = client();
        assert_eq!(c.incr_by("n", 5).await.unwrap(), 5);
        assert_eq!(c.incr_by("n", -3).await.unwrap(), 2);
        assert_eq!(c.decr_by("n", 2).await.unwrap(), 0);
        assert_eq!(c.get::<i64>("n").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_incr_on_text_fails() {
        let c = client();
        c.set("word", "hello").await.unwrap();
        assert!(matches!(
            c.incr_by("word", 1).await,
            Err(CacheError::NotAnInteger)
        ));
    }

    #[tokio::test]
    async fn test_append() {
        let c = client();
        assert_eq!(c.append("log", "ab").await.unwrap(), 2);
        assert_eq!(c.append("log", "cde").await.unwrap(), 5);
        assert_eq!(c.get_raw("log").await.unwrap().as_deref(), Some("abcde"));
    }

    // == Hashes ==

    #[tokio::test]
    async fn test_hash_ops() {
        let c = client();
        c.h_set("h", "name", "ada").await.unwrap();
        c.h_set("h", "age", &36).await.unwrap();

        assert_eq!(c.h_get::<String>("h", "name").await.unwrap().as_deref(), Some("ada"));
        assert!(c.h_exists("h", "age").await.unwrap());
        assert!(!c.h_exists("h", "email").await.unwrap());

        let values: Vec<Option<serde_json::Value>> =
            c.h_mget("h", &["name", "missing"]).await.unwrap();
        assert_eq!(values, vec![Some(serde_json::json!("ada")), None]);

        assert_eq!(c.h_incr_by("h", "age", 1).await.unwrap(), 37);
        assert_eq!(c.h_del("h", &["age", "missing"]).await.unwrap(), 1);
        assert_eq!(c.h_del::<&str>("h", &[]).await.unwrap(), 0);

        let all: HashMap<String, String> = c.h_get_all("h").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["name"], "ada");
    }

    #[tokio::test]
    async fn test_h_mset() {
        let c = client();
        let mut fields = HashMap::new();
        fields.insert("a".to_string(), 1);
        fields.insert("b".to_string(), 2);
        c.h_mset("h", &fields).await.unwrap();

        let all: HashMap<String, i32> = c.h_get_all("h").await.unwrap();
        assert_eq!(all, fields);

        c.h_mset::<i32>("untouched", &HashMap::new()).await.unwrap();
        assert!(!c.has_key("untouched").await.unwrap());
        assert!(c.h_get_all::<i32>("untouched").await.unwrap().is_empty());
    }

    // == Lists ==

    #[tokio::test]
    async fn test_l_push_order() {
        let c = client();
        assert_eq!(c.l_push("l", &["x", "y"]).await.unwrap(), 2);

        let items: Vec<String> = c.l_range("l", 0, -1).await.unwrap();
        assert_eq!(items, vec!["y", "x"]);
    }

    #[tokio::test]
    async fn test_list_ops() {
        let c = client();
        c.r_push("l", &[1, 2, 3, 4, 5]).await.unwrap();

        assert_eq!(c.l_len("l").await.unwrap(), 5);
        assert_eq!(c.l_index::<i32>("l", -1).await.unwrap(), Some(5));
        assert_eq!(c.l_index::<i32>("l", 10).await.unwrap(), None);
        assert_eq!(c.l_pop::<i32>("l").await.unwrap(), Some(1));
        assert_eq!(c.r_pop::<i32>("l").await.unwrap(), Some(5));

        c.l_trim("l", 0, 1).await.unwrap();
        assert_eq!(c.l_range::<i32>("l", 0, -1).await.unwrap(), vec![2, 3]);
        assert!(is_invalid(c.l_push::<i32>("l", &[]).await));
        assert!(c.l_range::<i32>("absent", 0, -1).await.unwrap().is_empty());
    }

    // == Sets ==

    #[tokio::test]
    async fn test_set_ops() {
        let c = client();
        assert_eq!(c.s_add("s", &["a", "b", "c"]).await.unwrap(), 3);
        assert_eq!(c.s_add("s", &["a"]).await.unwrap(), 0);
        assert_eq!(c.s_card("s").await.unwrap(), 3);
        assert!(c.s_is_member("s", "a").await.unwrap());

        let mut members: Vec<String> = c.s_members("s").await.unwrap();
        members.sort();
        assert_eq!(members, vec!["a", "b", "c"]);

        let random: Option<String> = c.s_random_member("s").await.unwrap();
        assert!(members.contains(&random.unwrap()));

        let many: Vec<String> = c.s_random_members("s", 10).await.unwrap();
        assert_eq!(many.len(), 10);
        assert!(many.iter().all(|m| members.contains(m)));

        assert_eq!(c.s_rem("s", &["a", "zz"]).await.unwrap(), 1);
        let popped: String = c.s_pop("s").await.unwrap().unwrap();
        assert!(!c.s_is_member("s", &popped).await.unwrap());
        assert_eq!(c.s_card("s").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_s_move() {
        let c = client();
        c.s_add("src", &["m"]).await.unwrap();

        assert!(c.s_move("src", "dst", "m").await.unwrap());
        assert!(!c.s_is_member("src", "m").await.unwrap());
        assert!(c.s_is_member("dst", "m").await.unwrap());
        assert!(!c.s_move("src", "dst", "m").await.unwrap());
    }

    #[tokio::test]
    async fn test_s_union() {
        let c = client();
        c.s_add("a", &[1, 2]).await.unwrap();
        c.s_add("b", &[2, 3]).await.unwrap();

        let mut union: Vec<i32> = c.s_union("a", "b").await.unwrap();
        union.sort();
        assert_eq!(union, vec![1, 2, 3]);
    }

    // == Sorted Sets ==

    #[tokio::test]
    async fn test_sorted_set_rank_and_score_range() {
        let c = client();
        assert!(c.z_add("z", 1.0, "a").await.unwrap());
        assert!(c.z_add("z", 2.0, "b").await.unwrap());

        assert_eq!(c.z_rank("z", "b").await.unwrap(), Some(1));
        assert_eq!(c.z_rank("z", "nope").await.unwrap(), None);

        let low: Vec<String> = c.z_range_by_score("z", 0.0, 1.5).await.unwrap();
        assert_eq!(low, vec!["a"]);
    }

    #[tokio::test]
    async fn test_sorted_set_ops() {
        let c = client();
        c.z_add("z", 3.0, "c").await.unwrap();
        c.z_add("z", 1.0, "a").await.unwrap();
        c.z_add("z", 2.0, "b").await.unwrap();
        assert!(!c.z_add("z", 2.5, "b").await.unwrap());

        assert_eq!(c.z_card("z").await.unwrap(), 3);
        assert_eq!(c.z_score("z", "b").await.unwrap(), Some(2.5));
        assert_eq!(c.z_score("z", "nope").await.unwrap(), None);
        assert_eq!(c.z_count("z", 1.0, 2.5).await.unwrap(), 2);

        assert_eq!(c.z_incr_by("z", 4.0, "new").await.unwrap(), 4.0);
        assert_eq!(c.z_incr_by("z", 0.5, "a").await.unwrap(), 1.5);

        let asc: Vec<String> = c.z_range("z", 0, -1).await.unwrap();
        assert_eq!(asc, vec!["a", "b", "c", "new"]);
        let desc: Vec<String> = c.z_reverse_range("z", 0, 1).await.unwrap();
        assert_eq!(desc, vec!["new", "c"]);

        assert_eq!(c.z_rem("z", &["new", "missing"]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reverse_range_by_score_takes_max_first() {
        let c = client();
        c.z_add("z", 1.0, "a").await.unwrap();
        c.z_add("z", 2.0, "b").await.unwrap();
        c.z_add("z", 3.0, "c").await.unwrap();

        let desc: Vec<String> = c.z_reverse_range_by_score("z", 2.0, 1.0).await.unwrap();
        assert_eq!(desc, vec!["b", "a"]);

        let swapped: Vec<String> = c.z_reverse_range_by_score("z", 1.0, 2.0).await.unwrap();
        assert!(swapped.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_shape_surfaces_store_error() {
        let c = client();
        c.s_add("s", &["a"]).await.unwrap();

        assert!(matches!(
            c.l_push("s", &["x"]).await,
            Err(CacheError::WrongType)
        ));
        assert!(matches!(
            c.get::<String>("s").await,
            Err(CacheError::WrongType)
        ));
    }
}
