//! Memory Store Module
//!
//! In-process store speaking the same command semantics as Redis:
//! shape-tagged entries, TTL expiry (lazily on access and by periodic
//! sweep) and `WRONGTYPE` errors on shape mismatches.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use glob::Pattern;
use rand::seq::{IteratorRandom, SliceRandom};
use tokio::sync::RwLock;

use crate::cache::entry::{current_timestamp_ms, CacheEntry, StoredValue};
use crate::cache::expiry::{TTL_KEY_MISSING, TTL_PERSISTENT};
use crate::cache::{Shape, Store};
use crate::error::{CacheError, Result};

type Entries = HashMap<String, CacheEntry>;

// == Memory Store ==
/// In-process key-value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<Entries>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    // == Purge Expired ==
    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub async fn purge_expired(&self) -> usize {
        let now = current_timestamp_ms();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }

    // == Length ==
    /// Returns the number of stored entries, expired ones included until
    /// they are purged or touched.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

// == Entry Access Helpers ==

/// Returns the live entry for `key`, dropping it first if it has expired.
fn live<'a>(entries: &'a mut Entries, key: &str) -> Option<&'a mut CacheEntry> {
    if entries.get(key).is_some_and(|e| e.is_expired()) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

/// Removes `key` if it holds a collection that has become empty.
fn drop_if_empty(entries: &mut Entries, key: &str) {
    if entries
        .get(key)
        .is_some_and(|e| e.value.is_empty_collection())
    {
        entries.remove(key);
    }
}

/// Generates a reader (`None` when absent) and a writer (creates an empty
/// collection when absent) for one collection shape.
macro_rules! shape_access {
    ($get:ident, $get_or_create:ident, $variant:ident, $ty:ty) => {
        fn $get<'a>(entries: &'a mut Entries, key: &str) -> Result<Option<&'a mut $ty>> {
            match live(entries, key) {
                None => Ok(None),
                Some(CacheEntry {
                    value: StoredValue::$variant(inner),
                    ..
                }) => Ok(Some(inner)),
                Some(_) => Err(CacheError::WrongType),
            }
        }

        fn $get_or_create<'a>(entries: &'a mut Entries, key: &str) -> Result<&'a mut $ty> {
            if live(entries, key).is_none() {
                entries.insert(
                    key.to_string(),
                    CacheEntry::new(StoredValue::$variant(Default::default())),
                );
            }
            match entries.get_mut(key) {
                Some(CacheEntry {
                    value: StoredValue::$variant(inner),
                    ..
                }) => Ok(inner),
                _ => Err(CacheError::WrongType),
            }
        }
    };
}

shape_access!(hash_of, hash_or_create, Hash, HashMap<String, String>);
shape_access!(list_of, list_or_create, List, VecDeque<String>);
shape_access!(set_of, set_or_create, Set, HashSet<String>);
shape_access!(zset_of, zset_or_create, SortedSet, HashMap<String, f64>);

fn string_of<'a>(entries: &'a mut Entries, key: &str) -> Result<Option<&'a mut String>> {
    match live(entries, key) {
        None => Ok(None),
        Some(CacheEntry {
            value: StoredValue::Str(s),
            ..
        }) => Ok(Some(s)),
        Some(_) => Err(CacheError::WrongType),
    }
}

// == Index Helpers ==

/// Resolves an inclusive `[start, stop]` range with negative indices
/// counted from the tail. `None` means the range selects nothing.
fn resolve_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { len + index } else { index };
    (0..len).contains(&index).then_some(index as usize)
}

/// Members ordered by ascending score, ties broken by member.
fn ordered(zset: &HashMap<String, f64>) -> Vec<(&String, f64)> {
    let mut members: Vec<(&String, f64)> = zset.iter().map(|(m, s)| (m, *s)).collect();
    // NaN never reaches a stored score, and -0.0 ties with 0.0.
    members.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    members
}

fn slice_range(members: Vec<String>, start: i64, stop: i64) -> Vec<String> {
    match resolve_range(start, stop, members.len()) {
        Some((from, to)) => members[from..=to].to_vec(),
        None => Vec::new(),
    }
}

/// Parses a stored integer. Only canonical decimal text is accepted: no
/// leading `+`, no leading zeros, no `-0`.
fn parse_int(raw: &str) -> Result<i64> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    let canonical = match digits.as_bytes() {
        [b'0'] => raw == "0",
        [first, ..] => (b'1'..=b'9').contains(first),
        [] => false,
    };
    if !canonical {
        return Err(CacheError::NotAnInteger);
    }
    raw.parse::<i64>().map_err(|_| CacheError::NotAnInteger)
}

/// Translates a Redis-style glob (`[^a]` negation) into the glob crate's
/// syntax (`[!a]`).
fn compile_pattern(pattern: &str) -> Result<Pattern> {
    Pattern::new(&pattern.replace("[^", "[!"))
        .map_err(|e| CacheError::InvalidArgument(format!("keys: bad pattern: {e}")))
}

fn random_member(set: &HashSet<String>) -> Option<String> {
    set.iter().choose(&mut rand::thread_rng()).cloned()
}

fn random_members(set: &HashSet<String>, count: i64) -> Vec<String> {
    let mut rng = rand::thread_rng();
    if count >= 0 {
        return set
            .iter()
            .choose_multiple(&mut rng, count as usize)
            .into_iter()
            .cloned()
            .collect();
    }
    let pool: Vec<&String> = set.iter().collect();
    (0..count.unsigned_abs())
        .filter_map(|_| pool.choose(&mut rng).map(|m| (*m).clone()))
        .collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    // == Keys ==

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        Ok(live(&mut entries, key).is_some())
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let mut removed = 0;
        for key in keys {
            if live(&mut entries, key).is_some() {
                entries.remove(key);
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn pexpire(&self, key: &str, ttl_ms: i64) -> Result<bool> {
        let at_ms = (current_timestamp_ms() as i64).saturating_add(ttl_ms);
        self.pexpire_at(key, at_ms).await
    }

    async fn pexpire_at(&self, key: &str, at_ms: i64) -> Result<bool> {
        let mut entries = self.entries.write().await;
        let Some(entry) = live(&mut entries, key) else {
            return Ok(false);
        };
        if at_ms <= current_timestamp_ms() as i64 {
            entries.remove(key);
        } else {
            entry.expires_at = Some(at_ms as u64);
        }
        Ok(true)
    }

    async fn persist(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        Ok(live(&mut entries, key)
            .and_then(|entry| entry.expires_at.take())
            .is_some())
    }

    async fn pttl(&self, key: &str) -> Result<i64> {
        let mut entries = self.entries.write().await;
        Ok(match live(&mut entries, key) {
            None => TTL_KEY_MISSING,
            Some(entry) => entry
                .ttl_remaining_ms()
                .map(|ms| ms as i64)
                .unwrap_or(TTL_PERSISTENT),
        })
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = compile_pattern(pattern)?;
        let now = current_timestamp_ms();
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired_at(now) && pattern.matches(key))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn shape(&self, key: &str) -> Result<Option<Shape>> {
        let mut entries = self.entries.write().await;
        Ok(live(&mut entries, key).map(|entry| entry.value.shape()))
    }

    // == Scalars ==

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.write().await;
        Ok(string_of(&mut entries, key)?.cloned())
    }

    async fn set(&self, key: &str, value: String, ttl_ms: Option<u64>) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry::with_ttl_ms(StoredValue::Str(value), ttl_ms),
        );
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: String, ttl_ms: Option<u64>) -> Result<bool> {
        let mut entries = self.entries.write().await;
        if live(&mut entries, key).is_some() {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            CacheEntry::with_ttl_ms(StoredValue::Str(value), ttl_ms),
        );
        Ok(true)
    }

    async fn get_set(&self, key: &str, value: String) -> Result<Option<String>> {
        let mut entries = self.entries.write().await;
        let previous = string_of(&mut entries, key)?.cloned();
        entries.insert(key.to_string(), CacheEntry::new(StoredValue::Str(value)));
        Ok(previous)
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        let mut entries = self.entries.write().await;
        Ok(keys
            .iter()
            .map(|key| match live(&mut entries, key) {
                Some(CacheEntry {
                    value: StoredValue::Str(s),
                    ..
                }) => Some(s.clone()),
                _ => None,
            })
            .collect())
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let mut entries = self.entries.write().await;
        match string_of(&mut entries, key)? {
            Some(current) => {
                let next = parse_int(current)?
                    .checked_add(delta)
                    .ok_or(CacheError::NotAnInteger)?;
                *current = next.to_string();
                Ok(next)
            }
            None => {
                entries.insert(
                    key.to_string(),
                    CacheEntry::new(StoredValue::Str(delta.to_string())),
                );
                Ok(delta)
            }
        }
    }

    async fn append(&self, key: &str, value: &str) -> Result<u64> {
        let mut entries = self.entries.write().await;
        match string_of(&mut entries, key)? {
            Some(current) => {
                current.push_str(value);
                Ok(current.len() as u64)
            }
            None => {
                entries.insert(
                    key.to_string(),
                    CacheEntry::new(StoredValue::Str(value.to_string())),
                );
                Ok(value.len() as u64)
            }
        }
    }

    // == Hashes ==

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        let mut entries = self.entries.write().await;
        Ok(hash_of(&mut entries, key)?.and_then(|h| h.get(field).cloned()))
    }

    async fn hset(&self, key: &str, field: &str, value: String) -> Result<()> {
        let mut entries = self.entries.write().await;
        hash_or_create(&mut entries, key)?.insert(field.to_string(), value);
        Ok(())
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        Ok(hash_of(&mut entries, key)?.is_some_and(|h| h.contains_key(field)))
    }

    async fn hdel(&self, key: &str, fields: &[String]) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let removed = match hash_of(&mut entries, key)? {
            Some(hash) => fields.iter().filter(|f| hash.remove(*f).is_some()).count(),
            None => 0,
        };
        drop_if_empty(&mut entries, key);
        Ok(removed as u64)
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let mut entries = self.entries.write().await;
        Ok(hash_of(&mut entries, key)?.cloned().unwrap_or_default())
    }

    async fn hmset(&self, key: &str, items: Vec<(String, String)>) -> Result<()> {
        let mut entries = self.entries.write().await;
        hash_or_create(&mut entries, key)?.extend(items);
        Ok(())
    }

    async fn hmget(&self, key: &str, fields: &[String]) -> Result<Vec<Option<String>>> {
        let mut entries = self.entries.write().await;
        let hash = hash_of(&mut entries, key)?;
        Ok(fields
            .iter()
            .map(|f| hash.as_ref().and_then(|h| h.get(f).cloned()))
            .collect())
    }

    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64> {
        let mut entries = self.entries.write().await;
        let hash = hash_or_create(&mut entries, key)?;
        let current = match hash.get(field) {
            Some(raw) => parse_int(raw)?,
            None => 0,
        };
        let next = current.checked_add(delta).ok_or(CacheError::NotAnInteger)?;
        hash.insert(field.to_string(), next.to_string());
        Ok(next)
    }

    // == Lists ==

    async fn lpush(&self, key: &str, values: Vec<String>) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let list = list_or_create(&mut entries, key)?;
        for value in values {
            list.push_front(value);
        }
        Ok(list.len() as u64)
    }

    async fn rpush(&self, key: &str, values: Vec<String>) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let list = list_or_create(&mut entries, key)?;
        list.extend(values);
        Ok(list.len() as u64)
    }

    async fn lpop(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.write().await;
        let popped = list_of(&mut entries, key)?.and_then(|l| l.pop_front());
        drop_if_empty(&mut entries, key);
        Ok(popped)
    }

    async fn rpop(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.write().await;
        let popped = list_of(&mut entries, key)?.and_then(|l| l.pop_back());
        drop_if_empty(&mut entries, key);
        Ok(popped)
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let mut entries = self.entries.write().await;
        let Some(list) = list_of(&mut entries, key)? else {
            return Ok(Vec::new());
        };
        Ok(match resolve_range(start, stop, list.len()) {
            Some((from, to)) => list.range(from..=to).cloned().collect(),
            None => Vec::new(),
        })
    }

    async fn ltrim(&self, key: &str, start: i64, stop: i64) -> Result<()> {
        let mut entries = self.entries.write().await;
        if let Some(list) = list_of(&mut entries, key)? {
            match resolve_range(start, stop, list.len()) {
                Some((from, to)) => *list = list.range(from..=to).cloned().collect(),
                None => list.clear(),
            }
        }
        drop_if_empty(&mut entries, key);
        Ok(())
    }

    async fn lindex(&self, key: &str, index: i64) -> Result<Option<String>> {
        let mut entries = self.entries.write().await;
        Ok(list_of(&mut entries, key)?.and_then(|list| {
            resolve_index(index, list.len()).and_then(|i| list.get(i).cloned())
        }))
    }

    async fn llen(&self, key: &str) -> Result<u64> {
        let mut entries = self.entries.write().await;
        Ok(list_of(&mut entries, key)?.map_or(0, |l| l.len() as u64))
    }

    // == Sets ==

    async fn sadd(&self, key: &str, members: Vec<String>) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let set = set_or_create(&mut entries, key)?;
        let added = members.into_iter().filter(|m| set.insert(m.clone())).count();
        Ok(added as u64)
    }

    async fn scard(&self, key: &str) -> Result<u64> {
        let mut entries = self.entries.write().await;
        Ok(set_of(&mut entries, key)?.map_or(0, |s| s.len() as u64))
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        Ok(set_of(&mut entries, key)?.is_some_and(|s| s.contains(member)))
    }

    async fn srandmember(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.write().await;
        Ok(set_of(&mut entries, key)?.and_then(|s| random_member(s)))
    }

    async fn srandmember_count(&self, key: &str, count: i64) -> Result<Vec<String>> {
        let mut entries = self.entries.write().await;
        Ok(set_of(&mut entries, key)?
            .map(|s| random_members(s, count))
            .unwrap_or_default())
    }

    async fn spop(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.write().await;
        let popped = match set_of(&mut entries, key)? {
            Some(set) => {
                let member = random_member(set);
                if let Some(m) = &member {
                    set.remove(m);
                }
                member
            }
            None => None,
        };
        drop_if_empty(&mut entries, key);
        Ok(popped)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let mut entries = self.entries.write().await;
        Ok(set_of(&mut entries, key)?
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn srem(&self, key: &str, members: &[String]) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let removed = match set_of(&mut entries, key)? {
            Some(set) => members.iter().filter(|m| set.remove(*m)).count(),
            None => 0,
        };
        drop_if_empty(&mut entries, key);
        Ok(removed as u64)
    }

    async fn smove(&self, src: &str, dst: &str, member: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        // An absent source answers 0 before any type check.
        if set_of(&mut entries, src)?.is_none() {
            return Ok(false);
        }
        set_of(&mut entries, dst)?;
        let Some(source) = set_of(&mut entries, src)? else {
            return Ok(false);
        };
        if !source.contains(member) {
            return Ok(false);
        }
        if src == dst {
            return Ok(true);
        }
        source.remove(member);
        drop_if_empty(&mut entries, src);
        set_or_create(&mut entries, dst)?.insert(member.to_string());
        Ok(true)
    }

    async fn sunion(&self, keys: &[String]) -> Result<Vec<String>> {
        let mut entries = self.entries.write().await;
        let mut union = HashSet::new();
        for key in keys {
            if let Some(set) = set_of(&mut entries, key)? {
                union.extend(set.iter().cloned());
            }
        }
        Ok(union.into_iter().collect())
    }

    // == Sorted Sets ==

    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<bool> {
        if score.is_nan() {
            return Err(CacheError::NotAFloat);
        }
        let mut entries = self.entries.write().await;
        let zset = zset_or_create(&mut entries, key)?;
        Ok(zset.insert(member.to_string(), score).is_none())
    }

    async fn zrem(&self, key: &str, members: &[String]) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let removed = match zset_of(&mut entries, key)? {
            Some(zset) => members.iter().filter(|m| zset.remove(*m).is_some()).count(),
            None => 0,
        };
        drop_if_empty(&mut entries, key);
        Ok(removed as u64)
    }

    async fn zcard(&self, key: &str) -> Result<u64> {
        let mut entries = self.entries.write().await;
        Ok(zset_of(&mut entries, key)?.map_or(0, |z| z.len() as u64))
    }

    async fn zincr_by(&self, key: &str, delta: f64, member: &str) -> Result<f64> {
        let mut entries = self.entries.write().await;
        let zset = zset_or_create(&mut entries, key)?;
        let next = zset.get(member).copied().unwrap_or(0.0) + delta;
        if next.is_nan() {
            drop_if_empty(&mut entries, key);
            return Err(CacheError::NotAFloat);
        }
        zset.insert(member.to_string(), next);
        Ok(next)
    }

    async fn zcount(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        let mut entries = self.entries.write().await;
        Ok(zset_of(&mut entries, key)?.map_or(0, |z| {
            z.values().filter(|s| (min..=max).contains(*s)).count() as u64
        }))
    }

    async fn zrank(&self, key: &str, member: &str) -> Result<Option<u64>> {
        let mut entries = self.entries.write().await;
        Ok(zset_of(&mut entries, key)?.and_then(|z| {
            ordered(z)
                .iter()
                .position(|(m, _)| m.as_str() == member)
                .map(|p| p as u64)
        }))
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        let mut entries = self.entries.write().await;
        Ok(zset_of(&mut entries, key)?.and_then(|z| z.get(member).copied()))
    }

    async fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let mut entries = self.entries.write().await;
        let members: Vec<String> = zset_of(&mut entries, key)?
            .map(|z| ordered(z).into_iter().map(|(m, _)| m.clone()).collect())
            .unwrap_or_default();
        Ok(slice_range(members, start, stop))
    }

    async fn zrevrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let mut entries = self.entries.write().await;
        let members: Vec<String> = zset_of(&mut entries, key)?
            .map(|z| ordered(z).into_iter().rev().map(|(m, _)| m.clone()).collect())
            .unwrap_or_default();
        Ok(slice_range(members, start, stop))
    }

    async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> Result<Vec<String>> {
        let mut entries = self.entries.write().await;
        Ok(zset_of(&mut entries, key)?
            .map(|z| {
                ordered(z)
                    .into_iter()
                    .filter(|(_, s)| (min..=max).contains(s))
                    .map(|(m, _)| m.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn zrevrange_by_score(&self, key: &str, max: f64, min: f64) -> Result<Vec<String>> {
        let mut entries = self.entries.write().await;
        Ok(zset_of(&mut entries, key)?
            .map(|z| {
                ordered(z)
                    .into_iter()
                    .rev()
                    .filter(|(_, s)| (min..=max).contains(s))
                    .map(|(m, _)| m.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_store_new() {
        let store = MemoryStore::new();
        assert_eq!(store.len().await, 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryStore::new();
        store.set("key1", "value1".to_string(), None).await.unwrap();

        assert_eq!(store.get("key1").await.unwrap().as_deref(), Some("value1"));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_wrong_type() {
        let store = MemoryStore::new();
        store.rpush("list", strings(&["a"])).await.unwrap();

        assert!(matches!(store.get("list").await, Err(CacheError::WrongType)));
        assert!(matches!(
            store.sadd("list", strings(&["x"])).await,
            Err(CacheError::WrongType)
        ));
        assert!(matches!(
            store.incr_by("list", 1).await,
            Err(CacheError::WrongType)
        ));
    }

    #[tokio::test]
    async fn test_incr_rejects_non_integer() {
        let store = MemoryStore::new();
        store.set("word", "hello".to_string(), None).await.unwrap();

        assert!(matches!(
            store.incr_by("word", 1).await,
            Err(CacheError::NotAnInteger)
        ));
    }

    #[tokio::test]
    async fn test_incr_rejects_non_canonical_integers() {
        let store = MemoryStore::new();
        for raw in ["+5", "05", "-0", " 5", ""] {
            store.set("n", raw.to_string(), None).await.unwrap();
            assert!(
                matches!(store.incr_by("n", 1).await, Err(CacheError::NotAnInteger)),
                "{raw:?} should not parse"
            );
        }

        store.set("n", "-5".to_string(), None).await.unwrap();
        assert_eq!(store.incr_by("n", 1).await.unwrap(), -4);
        store.set("n", "0".to_string(), None).await.unwrap();
        assert_eq!(store.incr_by("n", 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_incr_overflow() {
        let store = MemoryStore::new();
        store.set("n", i64::MAX.to_string(), None).await.unwrap();
        assert!(matches!(
            store.incr_by("n", 1).await,
            Err(CacheError::NotAnInteger)
        ));
    }

    #[tokio::test]
    async fn test_lazy_expiry() {
        let store = MemoryStore::new();
        store.set("short", "v".to_string(), Some(30)).await.unwrap();
        assert!(store.exists("short").await.unwrap());

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(!store.exists("short").await.unwrap());
        assert_eq!(store.pttl("short").await.unwrap(), TTL_KEY_MISSING);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = MemoryStore::new();
        store.set("short", "v".to_string(), Some(20)).await.unwrap();
        store.set("long", "v".to_string(), None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_set_clears_ttl() {
        let store = MemoryStore::new();
        store.set("k", "a".to_string(), Some(10_000)).await.unwrap();
        assert!(store.pttl("k").await.unwrap() > 0);

        store.set("k", "b".to_string(), None).await.unwrap();
        assert_eq!(store.pttl("k").await.unwrap(), TTL_PERSISTENT);
    }

    #[tokio::test]
    async fn test_pexpire_in_past_deletes() {
        let store = MemoryStore::new();
        store.set("k", "a".to_string(), None).await.unwrap();

        assert!(store.pexpire("k", 0).await.unwrap());
        assert!(!store.exists("k").await.unwrap());
        assert!(!store.pexpire("k", 1000).await.unwrap());
    }

    #[tokio::test]
    async fn test_emptied_collection_is_removed() {
        let store = MemoryStore::new();
        store.rpush("list", strings(&["only"])).await.unwrap();
        store.lpop("list").await.unwrap();
        assert!(!store.exists("list").await.unwrap());

        store.hset("hash", "f", "v".to_string()).await.unwrap();
        store.hdel("hash", &strings(&["f"])).await.unwrap();
        assert_eq!(store.shape("hash").await.unwrap(), None);

        store.sadd("set", strings(&["a", "b"])).await.unwrap();
        assert_eq!(store.srem("set", &strings(&["a", "b"])).await.unwrap(), 2);
        assert_eq!(store.shape("set").await.unwrap(), None);

        store.sadd("popped", strings(&["only"])).await.unwrap();
        assert_eq!(store.spop("popped").await.unwrap().as_deref(), Some("only"));
        assert!(!store.exists("popped").await.unwrap());

        store.sadd("src", strings(&["m"])).await.unwrap();
        assert!(store.smove("src", "dst", "m").await.unwrap());
        assert_eq!(store.shape("src").await.unwrap(), None);
        assert_eq!(store.shape("dst").await.unwrap(), Some(Shape::Set));

        store.zadd("zset", 1.0, "a").await.unwrap();
        assert_eq!(store.zrem("zset", &strings(&["a"])).await.unwrap(), 1);
        assert_eq!(store.shape("zset").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lrange_and_trim_indices() {
        let store = MemoryStore::new();
        store
            .rpush("l", strings(&["a", "b", "c", "d", "e"]))
            .await
            .unwrap();

        assert_eq!(store.lrange("l", 1, 2).await.unwrap(), strings(&["b", "c"]));
        assert_eq!(store.lrange("l", -2, -1).await.unwrap(), strings(&["d", "e"]));
        assert_eq!(store.lrange("l", 3, 100).await.unwrap(), strings(&["d", "e"]));
        assert!(store.lrange("l", 4, 1).await.unwrap().is_empty());
        assert_eq!(store.lindex("l", -1).await.unwrap().as_deref(), Some("e"));
        assert_eq!(store.lindex("l", 9).await.unwrap(), None);

        store.ltrim("l", 1, -2).await.unwrap();
        assert_eq!(
            store.lrange("l", 0, -1).await.unwrap(),
            strings(&["b", "c", "d"])
        );

        store.ltrim("l", 5, 10).await.unwrap();
        assert!(!store.exists("l").await.unwrap());
    }

    #[tokio::test]
    async fn test_keys_pattern() {
        let store = MemoryStore::new();
        for key in ["user:1", "user:2", "session:1"] {
            store.set(key, "v".to_string(), None).await.unwrap();
        }

        assert_eq!(
            store.keys("user:*").await.unwrap(),
            strings(&["user:1", "user:2"])
        );
        assert_eq!(store.keys("*:[^2]").await.unwrap().len(), 2);
        assert_eq!(store.keys("*").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_random_members_with_repeats() {
        let store = MemoryStore::new();
        store.sadd("s", strings(&["a", "b"])).await.unwrap();

        assert_eq!(store.srandmember_count("s", -5).await.unwrap().len(), 5);
        assert_eq!(store.srandmember_count("s", 5).await.unwrap().len(), 2);
        assert!(store.srandmember_count("absent", -3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_smove_checks_destination_type() {
        let store = MemoryStore::new();
        store.sadd("src", strings(&["m"])).await.unwrap();
        store.set("dst", "scalar".to_string(), None).await.unwrap();

        assert!(matches!(
            store.smove("src", "dst", "m").await,
            Err(CacheError::WrongType)
        ));
        assert!(store.sismember("src", "m").await.unwrap());
    }

    #[tokio::test]
    async fn test_smove_absent_source_skips_type_check() {
        let store = MemoryStore::new();
        store.set("dst", "scalar".to_string(), None).await.unwrap();

        assert!(!store.smove("absent", "dst", "m").await.unwrap());
        assert_eq!(store.get("dst").await.unwrap().as_deref(), Some("scalar"));
    }

    #[tokio::test]
    async fn test_sorted_set_ties_are_lexicographic() {
        let store = MemoryStore::new();
        store.zadd("z", 1.0, "b").await.unwrap();
        store.zadd("z", 1.0, "a").await.unwrap();
        store.zadd("z", 0.5, "c").await.unwrap();

        assert_eq!(store.zrange("z", 0, -1).await.unwrap(), strings(&["c", "a", "b"]));
        assert_eq!(
            store.zrevrange("z", 0, -1).await.unwrap(),
            strings(&["b", "a", "c"])
        );
        assert_eq!(
            store.zrevrange_by_score("z", 1.0, 0.0).await.unwrap(),
            strings(&["b", "a", "c"])
        );
    }

    #[tokio::test]
    async fn test_negative_zero_score_ties_with_zero() {
        let store = MemoryStore::new();
        store.zadd("z", 0.0, "a").await.unwrap();
        store.zadd("z", -0.0, "b").await.unwrap();

        assert_eq!(store.zrange("z", 0, -1).await.unwrap(), strings(&["a", "b"]));
        assert_eq!(store.zrank("z", "b").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_zincr_by_nan_result_rejected() {
        let store = MemoryStore::new();
        store.zadd("z", f64::INFINITY, "a").await.unwrap();

        assert!(matches!(
            store.zincr_by("z", f64::NEG_INFINITY, "a").await,
            Err(CacheError::NotAFloat)
        ));
        assert_eq!(store.zscore("z", "a").await.unwrap(), Some(f64::INFINITY));
    }

    #[tokio::test]
    async fn test_zadd_rejects_nan() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.zadd("z", f64::NAN, "a").await,
            Err(CacheError::NotAFloat)
        ));
        assert!(!store.exists("z").await.unwrap());
    }

    #[test]
    fn test_resolve_range() {
        assert_eq!(resolve_range(0, -1, 3), Some((0, 2)));
        assert_eq!(resolve_range(-100, 1, 3), Some((0, 1)));
        assert_eq!(resolve_range(2, 1, 3), None);
        assert_eq!(resolve_range(0, -1, 0), None);
        assert_eq!(resolve_range(0, -5, 3), None);
    }
}
