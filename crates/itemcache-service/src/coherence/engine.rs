//! The coherence engine.
//!
//! Read path: cache, then a single lease-holding filler per key, with
//! everyone else polling briefly before reading the store uncached.
//! Write path: store first, then invalidate; never pre-populate.
//!
//! The fill lease lives in the cache next to the line it guards. A fill only
//! lands while its lease is still held, and an invalidation deletes the line
//! and the lease together, so a fill that read the store before a commit
//! cannot overwrite that commit's invalidation.

use super::{CoherenceMetrics, InvalidationQueue};
use crate::cache::{CacheEntry, CacheInterface, CacheKeys, CachedValue, NegativeEntry};
use crate::lock::{CacheLeaseLock, DistributedLock, FillLease, LeaseOutcome};
use itemcache_config::CacheConfig;
use itemcache_core::{
    add_duration, Clock, Item, ItemCacheError, ItemCacheResult, ItemKey, ItemStatus, SystemClock,
    Version,
};
use itemcache_repository::ItemStore;
use itemcache_resilience::with_deadline;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Outcome of a read. Absence is a result, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Item),
    NotFound,
}

impl Lookup {
    #[must_use]
    pub fn into_item(self) -> Option<Item> {
        match self {
            Self::Found(item) => Some(item),
            Self::NotFound => None,
        }
    }

    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Outcome of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    Deleted,
    NotFound,
}

/// Keeps the cache coherent with the store.
///
/// Holds no in-process lock; cross-process coordination goes through the
/// fill lease and the cache's conditional writes. Every store, cache and
/// lease call is bounded by `operation_timeout_ms`.
pub struct CoherenceEngine {
    store: Arc<dyn ItemStore>,
    cache: Arc<dyn CacheInterface>,
    lock: Arc<dyn DistributedLock>,
    keys: CacheKeys,
    clock: Arc<dyn Clock>,
    settings: watch::Receiver<CacheConfig>,
    invalidations: InvalidationQueue,
}

/// Builder for [`CoherenceEngine`].
pub struct CoherenceEngineBuilder {
    store: Arc<dyn ItemStore>,
    cache: Arc<dyn CacheInterface>,
    settings: watch::Receiver<CacheConfig>,
    keys: CacheKeys,
    clock: Arc<dyn Clock>,
}

impl CoherenceEngineBuilder {
    /// Namespaces cache and lease keys.
    #[must_use]
    pub fn keys(mut self, keys: CacheKeys) -> Self {
        self.keys = keys;
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builds the engine, its [`CacheLeaseLock`] on the same cache, and starts
    /// the invalidation worker. Must be called inside a Tokio runtime.
    #[must_use]
    pub fn build(self) -> CoherenceEngine {
        let lock: Arc<dyn DistributedLock> = Arc::new(CacheLeaseLock::new(
            Arc::clone(&self.cache),
            self.keys.clone(),
            Arc::clone(&self.clock),
        ));
        let invalidations = InvalidationQueue::spawn(Arc::clone(&self.cache), self.settings.clone());

        CoherenceEngine {
            store: self.store,
            cache: self.cache,
            lock,
            keys: self.keys,
            clock: self.clock,
            settings: self.settings,
            invalidations,
        }
    }
}

impl CoherenceEngine {
    #[must_use]
    pub fn builder(
        store: Arc<dyn ItemStore>,
        cache: Arc<dyn CacheInterface>,
        settings: watch::Receiver<CacheConfig>,
    ) -> CoherenceEngineBuilder {
        CoherenceEngineBuilder {
            store,
            cache,
            settings,
            keys: CacheKeys::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Current tuning snapshot.
    #[must_use]
    pub fn settings(&self) -> CacheConfig {
        self.settings.borrow().clone()
    }

    // ============ Read path ============

    /// Reads an item through the cache.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn get(&self, key: &ItemKey) -> ItemCacheResult<Lookup> {
        let settings = self.settings();
        let cache_key = self.keys.item(key);

        match self.read_cache(&cache_key, &settings).await {
            Ok(Some(hit)) => return Ok(hit),
            Ok(None) => CoherenceMetrics::miss(),
            Err(e) => {
                warn!(error = %e, "Cache read failed, reading store directly");
                return self.read_direct(key, &settings, "cache_unavailable").await;
            }
        }

        let acquired = with_deadline(
            settings.operation_timeout(),
            self.lock.try_acquire(key, settings.fill_lease_ttl()),
            ItemCacheError::LockUnavailable,
        )
        .await;

        match acquired {
            Ok(LeaseOutcome::Acquired(lease)) => self.fill(key, &cache_key, lease, &settings).await,
            Ok(LeaseOutcome::Busy) => self.await_fill(key, &cache_key, &settings).await,
            Err(e) => {
                warn!(error = %e, "Fill lease unavailable, treating as busy");
                self.await_fill(key, &cache_key, &settings).await
            }
        }
    }

    /// Lists items straight from the store; listings are never cached.
    pub async fn list(&self, status: Option<ItemStatus>) -> ItemCacheResult<Vec<Item>> {
        let settings = self.settings();
        with_deadline(
            settings.operation_timeout(),
            self.store.find_all(status),
            ItemCacheError::StoreUnavailable,
        )
        .await
    }

    /// Decodes the cache line at `cache_key`. `Ok(None)` is a miss.
    async fn read_cache(&self, cache_key: &str, settings: &CacheConfig) -> ItemCacheResult<Option<Lookup>> {
        let raw = with_deadline(
            settings.operation_timeout(),
            self.cache.get_raw(cache_key),
            ItemCacheError::CacheUnavailable,
        )
        .await?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        match CachedValue::decode(&raw) {
            Ok(CachedValue::Item(entry)) => {
                debug!(version = %entry.version, "Cache hit");
                CoherenceMetrics::hit();
                Ok(Some(Lookup::Found(entry.into_item())))
            }
            Ok(CachedValue::Missing(negative)) if negative.is_live(self.clock.now()) => {
                debug!("Negative cache hit");
                CoherenceMetrics::negative_hit();
                Ok(Some(Lookup::NotFound))
            }
            Ok(CachedValue::Missing(_)) => Ok(None),
            Err(e) => {
                warn!(cache_key, error = %e, "Undecodable cache line, treating as miss");
                Ok(None)
            }
        }
    }

    /// Runs the fill as lease holder and always gives the lease back.
    async fn fill(
        &self,
        key: &ItemKey,
        cache_key: &str,
        mut lease: FillLease,
        settings: &CacheConfig,
    ) -> ItemCacheResult<Lookup> {
        // A previous holder may have filled between our miss and the acquire.
        let outcome = match self.read_cache(cache_key, settings).await {
            Ok(Some(hit)) => Ok(hit),
            _ => self.load_and_fill(key, cache_key, &mut lease, settings).await,
        };
        self.release(&lease, settings).await;
        outcome
    }

    async fn load_and_fill(
        &self,
        key: &ItemKey,
        cache_key: &str,
        lease: &mut FillLease,
        settings: &CacheConfig,
    ) -> ItemCacheResult<Lookup> {
        let (found, held) = self.read_store_renewing(key, lease, settings).await?;
        if !held {
            debug!("Fill lease lost during store read, result not cached");
            CoherenceMetrics::fill_abandoned();
            return Ok(found.map_or(Lookup::NotFound, Lookup::Found));
        }

        let now = self.clock.now();
        let (line, ttl) = match &found {
            Some(item) => (
                CachedValue::Item(CacheEntry::from_item(item, now)),
                settings.positive_ttl(),
            ),
            None => (
                CachedValue::Missing(NegativeEntry {
                    key: key.clone(),
                    expires_at: add_duration(now, settings.negative_ttl()),
                }),
                settings.negative_ttl(),
            ),
        };
        self.write_line(cache_key, &line, ttl, lease, settings).await;

        Ok(found.map_or(Lookup::NotFound, Lookup::Found))
    }

    /// Reads the store while renewing the lease every half TTL.
    ///
    /// The flag is `false` once a renewal found the lease gone, either
    /// expired or revoked by an invalidation.
    async fn read_store_renewing(
        &self,
        key: &ItemKey,
        lease: &mut FillLease,
        settings: &CacheConfig,
    ) -> ItemCacheResult<(Option<Item>, bool)> {
        let period = (settings.fill_lease_ttl() / 2).max(std::time::Duration::from_millis(1));
        let mut renewals = tokio::time::interval_at(Instant::now() + period, period);
        let read = self.read_store(key, settings);
        tokio::pin!(read);

        let mut held = true;
        loop {
            tokio::select! {
                found = &mut read => return found.map(|found| (found, held)),
                _ = renewals.tick(), if held => {
                    held = self.renew(lease, settings).await;
                }
            }
        }
    }

    /// Extends the lease. Only a definite answer that it is gone counts as
    /// lost; an unreachable cache leaves the decision to the guarded write.
    async fn renew(&self, lease: &mut FillLease, settings: &CacheConfig) -> bool {
        let renewed = with_deadline(
            settings.operation_timeout(),
            self.lock.renew(lease, settings.fill_lease_ttl()),
            ItemCacheError::LockUnavailable,
        )
        .await;

        match renewed {
            Ok(true) => {
                debug!(key = %lease.key, "Fill lease renewed");
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(key = %lease.key, error = %e, "Failed to renew fill lease");
                true
            }
        }
    }

    /// Writes a cache line if the lease is still held. Failures are logged
    /// and absorbed.
    async fn write_line(
        &self,
        cache_key: &str,
        line: &CachedValue,
        ttl: std::time::Duration,
        lease: &FillLease,
        settings: &CacheConfig,
    ) {
        let kind = match line {
            CachedValue::Item(_) => "item",
            CachedValue::Missing(_) => "missing",
        };
        let encoded = match line.encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(cache_key, error = %e, "Failed to encode cache line");
                return;
            }
        };

        let lease_key = self.keys.lease(&lease.key);
        let written = with_deadline(
            settings.operation_timeout(),
            self.cache.fill_if_held(
                cache_key,
                &encoded,
                line.fill_version(),
                ttl,
                &lease_key,
                &lease.owner,
            ),
            ItemCacheError::CacheUnavailable,
        )
        .await;

        match written {
            Ok(true) => {
                debug!(kind, "Cache filled");
                CoherenceMetrics::fill(kind);
            }
            Ok(false) => debug!(kind, "Lease revoked or newer line present, fill skipped"),
            Err(e) => warn!(cache_key, error = %e, "Cache fill failed"),
        }
    }

    async fn release(&self, lease: &FillLease, settings: &CacheConfig) {
        let released = with_deadline(
            settings.operation_timeout(),
            self.lock.release(lease),
            ItemCacheError::LockUnavailable,
        )
        .await;

        match released {
            Ok(true) => {}
            Ok(false) => debug!(key = %lease.key, "Fill lease expired before release"),
            Err(e) => warn!(key = %lease.key, error = %e, "Failed to release fill lease; it will expire"),
        }
    }

    /// Polls for another holder's fill, then falls back to the store.
    async fn await_fill(
        &self,
        key: &ItemKey,
        cache_key: &str,
        settings: &CacheConfig,
    ) -> ItemCacheResult<Lookup> {
        let deadline = Instant::now() + settings.fill_wait_timeout();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            tokio::time::sleep(settings.fill_poll_interval().min(remaining)).await;

            match self.read_cache(cache_key, settings).await {
                Ok(Some(hit)) => return Ok(hit),
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "Cache read failed while waiting for fill");
                    return self.read_direct(key, settings, "cache_unavailable").await;
                }
            }
        }

        debug!("Fill wait elapsed, reading store directly");
        self.read_direct(key, settings, "fill_wait_elapsed").await
    }

    /// Uncached store read; writes nothing to the cache.
    async fn read_direct(
        &self,
        key: &ItemKey,
        settings: &CacheConfig,
        reason: &'static str,
    ) -> ItemCacheResult<Lookup> {
        CoherenceMetrics::fallback_read(reason);
        let found = self.read_store(key, settings).await?;
        Ok(found.map_or(Lookup::NotFound, Lookup::Found))
    }

    async fn read_store(&self, key: &ItemKey, settings: &CacheConfig) -> ItemCacheResult<Option<Item>> {
        CoherenceMetrics::store_read();
        with_deadline(
            settings.operation_timeout(),
            self.store.find_by_key(key),
            ItemCacheError::StoreUnavailable,
        )
        .await
    }

    // ============ Write path ============

    /// Upserts an item, then invalidates its cache line.
    #[instrument(skip(self, payload), fields(key = %key))]
    pub async fn put(&self, key: &ItemKey, payload: &serde_json::Value) -> ItemCacheResult<Version> {
        let settings = self.settings();
        let version = with_deadline(
            settings.operation_timeout(),
            self.store.put(key, payload),
            ItemCacheError::StoreUnavailable,
        )
        .await?;

        self.invalidate(key, &settings).await;
        info!(%version, "Item written");
        Ok(version)
    }

    /// Replaces an item only at `expected`, then invalidates its cache line.
    ///
    /// A `VersionConflict` is returned as is and touches nothing.
    #[instrument(skip(self, payload), fields(key = %key, expected = %expected))]
    pub async fn put_versioned(
        &self,
        key: &ItemKey,
        payload: &serde_json::Value,
        expected: Version,
    ) -> ItemCacheResult<Version> {
        let settings = self.settings();
        let version = with_deadline(
            settings.operation_timeout(),
            self.store.put_if_version(key, payload, expected),
            ItemCacheError::StoreUnavailable,
        )
        .await?;

        self.invalidate(key, &settings).await;
        info!(%version, "Item written");
        Ok(version)
    }

    /// Deletes an item, then invalidates its cache line.
    ///
    /// The line is invalidated even when the store had no row, which also
    /// clears any tombstone.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn delete(&self, key: &ItemKey) -> ItemCacheResult<Deletion> {
        let settings = self.settings();
        let deleted = with_deadline(
            settings.operation_timeout(),
            self.store.delete(key),
            ItemCacheError::StoreUnavailable,
        )
        .await?;

        self.invalidate(key, &settings).await;
        if deleted {
            info!("Item deleted");
            Ok(Deletion::Deleted)
        } else {
            Ok(Deletion::NotFound)
        }
    }

    /// Deletes the cache line and the fill lease on a detached task so that
    /// a caller cancelled after the commit cannot skip it. Dropping the lease
    /// revokes any fill that read the store before this commit. Failures go
    /// to the retry queue.
    async fn invalidate(&self, key: &ItemKey, settings: &CacheConfig) {
        let cache = Arc::clone(&self.cache);
        let queue = self.invalidations.clone();
        let cache_keys = vec![self.keys.item(key), self.keys.lease(key)];
        let timeout = settings.operation_timeout();

        let task = tokio::spawn({
            let cache_keys = cache_keys.clone();
            async move {
                match with_deadline(timeout, cache.delete_many(&cache_keys), ItemCacheError::CacheUnavailable).await {
                    Ok(existed) => debug!(cache_keys = ?cache_keys, existed, "Cache line invalidated"),
                    Err(e) => {
                        warn!(cache_keys = ?cache_keys, error = %e, "Invalidation failed, scheduling retry");
                        queue.schedule(cache_keys);
                    }
                }
            }
        });

        if let Err(e) = task.await {
            warn!(cache_keys = ?cache_keys, error = %e, "Invalidation task aborted, scheduling retry");
            self.invalidations.schedule(cache_keys);
        }
    }
}

impl std::fmt::Debug for CoherenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoherenceEngine")
            .field("keys", &self.keys)
            .field("settings", &*self.settings.borrow())
            .finish_non_exhaustive()
    }
}
