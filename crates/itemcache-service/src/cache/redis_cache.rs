//! Redis-based cache implementation.

use super::CacheInterface;
use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use itemcache_core::{ItemCacheError, ItemCacheResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Deletes KEYS[1] only while it still holds ARGV[1].
const COMPARE_AND_DELETE: &str = r#"
    if redis.call("get", KEYS[1]) == ARGV[1] then
        return redis.call("del", KEYS[1])
    else
        return 0
    end
"#;

/// Re-arms the TTL of KEYS[1] only while it still holds ARGV[1].
const COMPARE_AND_EXPIRE: &str = r#"
    if redis.call("get", KEYS[1]) == ARGV[1] then
        return redis.call("pexpire", KEYS[1], ARGV[2])
    else
        return 0
    end
"#;

/// While lease KEYS[2] holds ARGV[4], writes ARGV[1] to KEYS[1] unless it
/// holds an item line at version >= ARGV[2].
const FILL_IF_HELD: &str = r#"
    if redis.call("get", KEYS[2]) ~= ARGV[4] then
        return 0
    end
    local current = redis.call("get", KEYS[1])
    if current then
        local ok, decoded = pcall(cjson.decode, current)
        if ok and type(decoded) == "table" and decoded["kind"] == "item"
            and tonumber(decoded["version"]) ~= nil
            and tonumber(decoded["version"]) >= tonumber(ARGV[2]) then
            return 0
        end
    end
    redis.call("set", KEYS[1], ARGV[1], "PX", ARGV[3])
    return 1
"#;

/// Redis-based cache service.
pub struct RedisCacheService {
    pool: Arc<Pool>,
}

impl RedisCacheService {
    /// Create a new Redis cache service.
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self { pool }
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> ItemCacheResult<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| ItemCacheError::cache(format!("Failed to get Redis connection: {}", e)))
    }
}

fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl CacheInterface for RedisCacheService {
    async fn get_raw(&self, key: &str) -> ItemCacheResult<Option<String>> {
        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| ItemCacheError::cache(format!("Failed to get key '{}': {}", key, e)))?;

        match &value {
            Some(_) => debug!("Cache hit for key '{}'", key),
            None => debug!("Cache miss for key '{}'", key),
        }

        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> ItemCacheResult<()> {
        let mut conn = self.get_conn().await?;
        let ttl_ms = ttl_millis(ttl);

        conn.pset_ex::<_, _, ()>(key, value, ttl_ms)
            .await
            .map_err(|e| ItemCacheError::cache(format!("Failed to set key '{}': {}", key, e)))?;

        debug!("Cached key '{}' with TTL {}ms", key, ttl_ms);
        Ok(())
    }

    async fn delete(&self, key: &str) -> ItemCacheResult<bool> {
        let mut conn = self.get_conn().await?;
        let deleted: i64 = conn
            .del(key)
            .await
            .map_err(|e| ItemCacheError::cache(format!("Failed to delete key '{}': {}", key, e)))?;

        debug!("Deleted key '{}': {}", key, deleted > 0);
        Ok(deleted > 0)
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> ItemCacheResult<bool> {
        let mut conn = self.get_conn().await?;

        let result: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(|e| ItemCacheError::cache(format!("Failed to set key '{}' NX: {}", key, e)))?;

        Ok(result.is_some())
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> ItemCacheResult<bool> {
        let mut conn = self.get_conn().await?;

        let deleted: i64 = redis::Script::new(COMPARE_AND_DELETE)
            .key(key)
            .arg(expected)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                ItemCacheError::cache(format!("Failed to compare-and-delete '{}': {}", key, e))
            })?;

        Ok(deleted > 0)
    }

    async fn compare_and_expire(&self, key: &str, expected: &str, ttl: Duration) -> ItemCacheResult<bool> {
        let mut conn = self.get_conn().await?;

        let updated: i64 = redis::Script::new(COMPARE_AND_EXPIRE)
            .key(key)
            .arg(expected)
            .arg(ttl_millis(ttl))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                ItemCacheError::cache(format!("Failed to compare-and-expire '{}': {}", key, e))
            })?;

        Ok(updated > 0)
    }

    async fn delete_many(&self, keys: &[String]) -> ItemCacheResult<u64> {
        let mut conn = self.get_conn().await?;
        let deleted: u64 = conn
            .del(keys.to_vec())
            .await
            .map_err(|e| ItemCacheError::cache(format!("Failed to delete keys {:?}: {}", keys, e)))?;

        debug!("Deleted {} of {:?}", deleted, keys);
        Ok(deleted)
    }

    async fn fill_if_held(
        &self,
        key: &str,
        value: &str,
        version: i64,
        ttl: Duration,
        lease_key: &str,
        owner: &str,
    ) -> ItemCacheResult<bool> {
        let mut conn = self.get_conn().await?;

        let written: i64 = redis::Script::new(FILL_IF_HELD)
            .key(key)
            .key(lease_key)
            .arg(value)
            .arg(version)
            .arg(ttl_millis(ttl))
            .arg(owner)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| ItemCacheError::cache(format!("Failed to fill key '{}': {}", key, e)))?;

        debug!("Fill of key '{}' at version {}: written={}", key, version, written > 0);
        Ok(written > 0)
    }

    async fn ping(&self) -> ItemCacheResult<()> {
        let mut conn = self.get_conn().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| ItemCacheError::cache(format!("Ping failed: {}", e)))?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.pool.status();
        f.debug_struct("RedisCacheService")
            .field("size", &status.size)
            .field("available", &status.available)
            .finish()
    }
}
