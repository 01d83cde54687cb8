//! # Redis Store
//!
//! `Store` implementation over a Redis server. Holds one
//! `ConnectionManager`, which multiplexes and reconnects on its own; every
//! command clones the handle and issues a single round trip.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::info;

use crate::cache::{Shape, Store};
use crate::error::Result;

/// Redis connection shared by all clones of the cache client.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Opens a managed connection to `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        info!("Connected to Redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    // =========================================================================
    // KEYS
    // =========================================================================

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(key).await?)
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        let mut conn = self.conn.clone();
        Ok(conn.del(keys).await?)
    }

    async fn pexpire(&self, key: &str, ttl_ms: i64) -> Result<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.pexpire(key, ttl_ms).await?)
    }

    async fn pexpire_at(&self, key: &str, at_ms: i64) -> Result<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.pexpire_at(key, at_ms).await?)
    }

    async fn persist(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.persist(key).await?)
    }

    async fn pttl(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn.clone();
        Ok(conn.pttl(key).await?)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut keys: Vec<String> = conn.keys(pattern).await?;
        keys.sort();
        Ok(keys)
    }

    async fn shape(&self, key: &str) -> Result<Option<Shape>> {
        let mut conn = self.conn.clone();
        let name: String = redis::cmd("TYPE").arg(key).query_async(&mut conn).await?;
        Ok(Shape::from_type_name(&name))
    }

    // =========================================================================
    // SCALARS
    // =========================================================================

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: String, ttl_ms: Option<u64>) -> Result<()> {
        let mut conn = self.conn.clone();
        match ttl_ms {
            Some(ms) => conn.pset_ex::<_, _, ()>(key, value, ms).await?,
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: String, ttl_ms: Option<u64>) -> Result<bool> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("NX");
        if let Some(ms) = ttl_ms {
            cmd.arg("PX").arg(ms);
        }
        // OK when written, nil when the key already existed
        let reply: Option<String> = cmd.query_async(&mut conn).await?;
        Ok(reply.is_some())
    }

    async fn get_set(&self, key: &str, value: String) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.getset(key, value).await?)
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        let mut conn = self.conn.clone();
        Ok(redis::cmd("MGET").arg(keys).query_async(&mut conn).await?)
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let mut conn = self.conn.clone();
        Ok(conn.incr(key, delta).await?)
    }

    async fn append(&self, key: &str, value: &str) -> Result<u64> {
        let mut conn = self.conn.clone();
        Ok(conn.append(key, value).await?)
    }

    // =========================================================================
    // HASHES
    // =========================================================================

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.hget(key, field).await?)
    }

    async fn hset(&self, key: &str, field: &str, value: String) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(key, field, value).await?;
        Ok(())
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.hexists(key, field).await?)
    }

    async fn hdel(&self, key: &str, fields: &[String]) -> Result<u64> {
        let mut conn = self.conn.clone();
        Ok(conn.hdel(key, fields).await?)
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let mut conn = self.conn.clone();
        Ok(conn.hgetall(key).await?)
    }

    async fn hmset(&self, key: &str, items: Vec<(String, String)>) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.hset_multiple::<_, _, _, ()>(key, &items).await?;
        Ok(())
    }

    async fn hmget(&self, key: &str, fields: &[String]) -> Result<Vec<Option<String>>> {
        let mut conn = self.conn.clone();
        Ok(redis::cmd("HMGET")
            .arg(key)
            .arg(fields)
            .query_async(&mut conn)
            .await?)
    }

    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64> {
        let mut conn = self.conn.clone();
        Ok(conn.hincr(key, field, delta).await?)
    }

    // =========================================================================
    // LISTS
    // =========================================================================

    async fn lpush(&self, key: &str, values: Vec<String>) -> Result<u64> {
        let mut conn = self.conn.clone();
        Ok(conn.lpush(key, values).await?)
    }

    async fn rpush(&self, key: &str, values: Vec<String>) -> Result<u64> {
        let mut conn = self.conn.clone();
        Ok(conn.rpush(key, values).await?)
    }

    async fn lpop(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.lpop(key, None).await?)
    }

    async fn rpop(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.rpop(key, None).await?)
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.lrange(key, start as isize, stop as isize).await?)
    }

    async fn ltrim(&self, key: &str, start: i64, stop: i64) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.ltrim::<_, ()>(key, start as isize, stop as isize)
            .await?;
        Ok(())
    }

    async fn lindex(&self, key: &str, index: i64) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.lindex(key, index as isize).await?)
    }

    async fn llen(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn.clone();
        Ok(conn.llen(key).await?)
    }

    // =========================================================================
    // SETS
    // =========================================================================

    async fn sadd(&self, key: &str, members: Vec<String>) -> Result<u64> {
        let mut conn = self.conn.clone();
        Ok(conn.sadd(key, members).await?)
    }

    async fn scard(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn.clone();
        Ok(conn.scard(key).await?)
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.sismember(key, member).await?)
    }

    async fn srandmember(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.srandmember(key).await?)
    }

    async fn srandmember_count(&self, key: &str, count: i64) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        Ok(redis::cmd("SRANDMEMBER")
            .arg(key)
            .arg(count)
            .query_async(&mut conn)
            .await?)
    }

    async fn spop(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.spop(key).await?)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.smembers(key).await?)
    }

    async fn srem(&self, key: &str, members: &[String]) -> Result<u64> {
        let mut conn = self.conn.clone();
        Ok(conn.srem(key, members).await?)
    }

    async fn smove(&self, src: &str, dst: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.smove(src, dst, member).await?)
    }

    async fn sunion(&self, keys: &[String]) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.sunion(keys).await?)
    }

    // =========================================================================
    // SORTED SETS
    // =========================================================================

    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let added: i64 = conn.zadd(key, member, score).await?;
        Ok(added > 0)
    }

    async fn zrem(&self, key: &str, members: &[String]) -> Result<u64> {
        let mut conn = self.conn.clone();
        Ok(conn.zrem(key, members).await?)
    }

    async fn zcard(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn.clone();
        Ok(conn.zcard(key).await?)
    }

    async fn zincr_by(&self, key: &str, delta: f64, member: &str) -> Result<f64> {
        let mut conn = self.conn.clone();
        Ok(conn.zincr(key, member, delta).await?)
    }

    async fn zcount(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        let mut conn = self.conn.clone();
        Ok(conn.zcount(key, min, max).await?)
    }

    async fn zrank(&self, key: &str, member: &str) -> Result<Option<u64>> {
        let mut conn = self.conn.clone();
        Ok(conn.zrank(key, member).await?)
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        let mut conn = self.conn.clone();
        Ok(conn.zscore(key, member).await?)
    }

    async fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.zrange(key, start as isize, stop as isize).await?)
    }

    async fn zrevrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.zrevrange(key, start as isize, stop as isize).await?)
    }

    async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.zrangebyscore(key, min, max).await?)
    }

    async fn zrevrange_by_score(&self, key: &str, max: f64, min: f64) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.zrevrangebyscore(key, max, min).await?)
    }
}
