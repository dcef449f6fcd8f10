//! Shared doubles for coherence tests.
//!
//! `CountingStore` is an in-memory store that counts point reads and can be
//! slowed down or broken; `FlakyCache` wraps an [`InMemoryCache`] and counts
//! or fails calls on demand.

#![allow(dead_code)]

use async_trait::async_trait;
use itemcache_config::CacheConfig;
use itemcache_core::{Clock, Item, ItemCacheError, ItemCacheResult, ItemKey, ItemStatus, Version};
use itemcache_repository::ItemStore;
use itemcache_service::{CacheInterface, CacheKeys, CoherenceEngine, InMemoryCache};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

pub fn key(raw: &str) -> ItemKey {
    ItemKey::parse(raw).unwrap()
}

pub fn payload(n: i64) -> serde_json::Value {
    serde_json::json!({ "n": n })
}

/// Settings with short waits so fallbacks happen quickly.
pub fn fast_settings() -> CacheConfig {
    CacheConfig {
        fill_poll_interval_ms: 5,
        fill_wait_timeout_ms: 200,
        operation_timeout_ms: 1000,
        invalidation_initial_backoff_ms: 10,
        ..CacheConfig::default()
    }
}

// ============ Store ============

#[derive(Default)]
pub struct CountingStore {
    items: Mutex<HashMap<ItemKey, Item>>,
    next_version: Mutex<i64>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    read_delay: Mutex<Duration>,
    failing: AtomicBool,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_read_delay(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = delay;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Writes directly, bypassing the engine.
    pub fn seed(&self, key: &ItemKey, payload: serde_json::Value) -> Version {
        let version = self.bump();
        self.items
            .lock()
            .unwrap()
            .insert(key.clone(), Item::new(key.clone(), payload, version));
        version
    }

    fn bump(&self) -> Version {
        let mut next = self.next_version.lock().unwrap();
        *next += 1;
        Version::new(*next)
    }

    fn check(&self) -> ItemCacheResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ItemCacheError::store("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl ItemStore for CountingStore {
    async fn find_by_key(&self, key: &ItemKey) -> ItemCacheResult<Option<Item>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let snapshot = self.items.lock().unwrap().get(key).cloned();
        let delay = *self.read_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(snapshot)
    }

    async fn find_all(&self, _status: Option<ItemStatus>) -> ItemCacheResult<Vec<Item>> {
        self.check()?;
        Ok(self.items.lock().unwrap().values().cloned().collect())
    }

    async fn put(&self, key: &ItemKey, payload: &serde_json::Value) -> ItemCacheResult<Version> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(self.seed(key, payload.clone()))
    }

    async fn put_if_version(
        &self,
        key: &ItemKey,
        payload: &serde_json::Value,
        expected: Version,
    ) -> ItemCacheResult<Version> {
        self.check()?;
        let actual = self.items.lock().unwrap().get(key).map(|item| item.version);
        if actual != Some(expected) {
            return Err(ItemCacheError::VersionConflict {
                key: key.to_string(),
                expected,
                actual,
            });
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(self.seed(key, payload.clone()))
    }

    async fn delete(&self, key: &ItemKey) -> ItemCacheResult<bool> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(self.items.lock().unwrap().remove(key).is_some())
    }
}

// ============ Cache ============

pub struct FlakyCache {
    inner: InMemoryCache,
    calls: AtomicUsize,
    down: AtomicBool,
    failing_deletes: AtomicUsize,
    delete_delay: Mutex<Duration>,
}

impl FlakyCache {
    pub fn new(clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryCache::new(clock),
            calls: AtomicUsize::new(0),
            down: AtomicBool::new(false),
            failing_deletes: AtomicUsize::new(0),
            delete_delay: Mutex::new(Duration::ZERO),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    /// Fails every call while set.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Fails the next `n` deletes, single or grouped.
    pub fn fail_deletes(&self, n: usize) {
        self.failing_deletes.store(n, Ordering::SeqCst);
    }

    pub fn set_delete_delay(&self, delay: Duration) {
        *self.delete_delay.lock().unwrap() = delay;
    }

    /// Reads a line without counting or failing.
    pub async fn peek(&self, cache_key: &str) -> Option<String> {
        self.inner.get_raw(cache_key).await.unwrap()
    }

    async fn before_delete(&self) -> ItemCacheResult<()> {
        self.enter()?;
        let delay = *self.delete_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let failed = self
            .failing_deletes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(ItemCacheError::cache("delete rejected"));
        }
        Ok(())
    }

    fn enter(&self) -> ItemCacheResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(ItemCacheError::cache("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheInterface for FlakyCache {
    async fn get_raw(&self, key: &str) -> ItemCacheResult<Option<String>> {
        self.enter()?;
        self.inner.get_raw(key).await
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> ItemCacheResult<()> {
        self.enter()?;
        self.inner.set_raw(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> ItemCacheResult<bool> {
        self.before_delete().await?;
        self.inner.delete(key).await
    }

    async fn delete_many(&self, keys: &[String]) -> ItemCacheResult<u64> {
        self.before_delete().await?;
        self.inner.delete_many(keys).await
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> ItemCacheResult<bool> {
        self.enter()?;
        self.inner.set_if_absent(key, value, ttl).await
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> ItemCacheResult<bool> {
        self.enter()?;
        self.inner.compare_and_delete(key, expected).await
    }

    async fn compare_and_expire(&self, key: &str, expected: &str, ttl: Duration) -> ItemCacheResult<bool> {
        self.enter()?;
        self.inner.compare_and_expire(key, expected, ttl).await
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
        self.enter()?;
        self.inner
            .fill_if_held(key, value, version, ttl, lease_key, owner)
            .await
    }

    async fn ping(&self) -> ItemCacheResult<()> {
        self.enter()
    }
}

// ============ Harness ============

pub struct Harness {
    pub engine: Arc<CoherenceEngine>,
    pub store: Arc<CountingStore>,
    pub cache: Arc<FlakyCache>,
    pub clock: Arc<itemcache_core::ManualClock>,
    pub settings: watch::Sender<CacheConfig>,
    pub keys: CacheKeys,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(fast_settings())
    }

    pub fn with_settings(settings: CacheConfig) -> Self {
        let clock = Arc::new(itemcache_core::ManualClock::default());
        let store = CountingStore::new();
        let cache = FlakyCache::new(clock.clone());
        let (tx, rx) = watch::channel(settings);
        let keys = CacheKeys::default();

        let engine = CoherenceEngine::builder(store.clone(), cache.clone(), rx)
            .keys(keys.clone())
            .clock(clock.clone())
            .build();

        Self {
            engine: Arc::new(engine),
            store,
            cache,
            clock,
            settings: tx,
            keys,
        }
    }

    pub fn item_line(&self, raw: &str) -> String {
        self.keys.item(&key(raw))
    }
}
