//! Cache interface trait for abstracted caching operations.

use async_trait::async_trait;
use itemcache_core::ItemCacheResult;
use shaku::Interface;
use std::time::Duration;

/// Cache adapter over a distributed key-value store with per-key TTL.
///
/// The cache is an acceleration layer only. Values are JSON strings so the
/// trait stays dyn-compatible; the conditional writes are the atomic
/// primitives the fill lease and the read path rely on.
#[async_trait]
pub trait CacheInterface: Interface + Send + Sync {
    /// Get a raw JSON value from the cache.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    async fn get_raw(&self, key: &str) -> ItemCacheResult<Option<String>>;

    /// Set a raw JSON value in the cache with a TTL.
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> ItemCacheResult<()>;

    /// Delete a value from the cache.
    ///
    /// Returns `true` if the key existed and was deleted.
    async fn delete(&self, key: &str) -> ItemCacheResult<bool>;

    /// Store `value` only if `key` is absent. Returns whether it was stored.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> ItemCacheResult<bool>;

    /// Delete `key` only if it currently holds `expected`.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> ItemCacheResult<bool>;

    /// Reset the TTL of `key` only if it currently holds `expected`.
    async fn compare_and_expire(&self, key: &str, expected: &str, ttl: Duration) -> ItemCacheResult<bool>;

    /// Delete several keys in one atomic step. Returns how many existed.
    async fn delete_many(&self, keys: &[String]) -> ItemCacheResult<u64>;

    /// Store an encoded cache line while `lease_key` still holds `owner`,
    /// unless the key already holds a positive entry at `version` or newer.
    /// Returns whether it was stored.
    ///
    /// The lease check and the write are one atomic step, so a lease revoked
    /// by an invalidation can no longer land a line read before it. Negative
    /// entries pass version 0 and therefore never replace a positive entry.
    async fn fill_if_held(
        &self,
        key: &str,
        value: &str,
        version: i64,
        ttl: Duration,
        lease_key: &str,
        owner: &str,
    ) -> ItemCacheResult<bool>;

    /// Round-trips the backend.
    async fn ping(&self) -> ItemCacheResult<()>;
}
