//! Lease lock built on the cache's atomic primitives.

use super::{DistributedLock, FillLease, LeaseOutcome};
use crate::cache::{CacheInterface, CacheKeys};
use async_trait::async_trait;
use itemcache_core::{add_duration, Clock, ItemCacheError, ItemCacheResult, ItemKey};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// `SET NX` with a TTL to acquire, compare-and-delete to release.
pub struct CacheLeaseLock {
    cache: Arc<dyn CacheInterface>,
    keys: CacheKeys,
    clock: Arc<dyn Clock>,
}

impl CacheLeaseLock {
    #[must_use]
    pub fn new(cache: Arc<dyn CacheInterface>, keys: CacheKeys, clock: Arc<dyn Clock>) -> Self {
        Self { cache, keys, clock }
    }
}

fn lock_error(err: ItemCacheError) -> ItemCacheError {
    match err {
        ItemCacheError::CacheUnavailable(msg) => ItemCacheError::LockUnavailable(msg),
        other => other,
    }
}

#[async_trait]
impl DistributedLock for CacheLeaseLock {
    async fn try_acquire(&self, key: &ItemKey, ttl: Duration) -> ItemCacheResult<LeaseOutcome> {
        let owner = Uuid::new_v4().to_string();
        let acquired = self
            .cache
            .set_if_absent(&self.keys.lease(key), &owner, ttl)
            .await
            .map_err(lock_error)?;

        if !acquired {
            debug!("Fill lease for '{}' is busy", key);
            return Ok(LeaseOutcome::Busy);
        }

        debug!("Acquired fill lease for '{}'", key);
        Ok(LeaseOutcome::Acquired(FillLease {
            key: key.clone(),
            owner,
            expires_at: add_duration(self.clock.now(), ttl),
        }))
    }

    async fn renew(&self, lease: &mut FillLease, ttl: Duration) -> ItemCacheResult<bool> {
        let renewed = self
            .cache
            .compare_and_expire(&self.keys.lease(&lease.key), &lease.owner, ttl)
            .await
            .map_err(lock_error)?;
        if renewed {
            lease.expires_at = add_duration(self.clock.now(), ttl);
        }
        Ok(renewed)
    }

    async fn release(&self, lease: &FillLease) -> ItemCacheResult<bool> {
        let released = self
            .cache
            .compare_and_delete(&self.keys.lease(&lease.key), &lease.owner)
            .await
            .map_err(lock_error)?;
        debug!("Released fill lease for '{}': {}", lease.key, released);
        Ok(released)
    }
}

impl std::fmt::Debug for CacheLeaseLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheLeaseLock")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}
