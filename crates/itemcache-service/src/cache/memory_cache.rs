//! In-process cache implementation.
//!
//! Used when Redis is disabled, in which case coherence and fill leases are
//! scoped to this process. Expiry is judged against an injected [`Clock`].

use super::{entry::blocks_fill, CacheInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use itemcache_core::{add_duration, Clock, ItemCacheResult, SystemClock};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Map size at which expired slots are first swept.
pub const DEFAULT_SWEEP_THRESHOLD: usize = 4096;

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Slots {
    map: HashMap<String, Slot>,
    threshold: usize,
    sweep_at: usize,
}

impl Slots {
    fn new(threshold: usize) -> Self {
        Self {
            map: HashMap::new(),
            threshold,
            sweep_at: threshold,
        }
    }

    /// Inserts a slot, sweeping expired ones first once the map has grown
    /// past the next sweep mark.
    fn insert(&mut self, key: &str, slot: Slot, now: DateTime<Utc>) {
        if self.map.len() >= self.sweep_at {
            self.sweep(now);
        }
        self.map.insert(key.to_string(), slot);
    }

    /// Drops expired slots and moves the sweep mark to twice the live size.
    fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.map.len();
        self.map.retain(|_, slot| slot.expires_at > now);
        self.sweep_at = (self.map.len() * 2).max(self.threshold);

        let removed = before - self.map.len();
        if removed > 0 {
            debug!("Swept {} expired cache slots, {} remain", removed, self.map.len());
        }
        removed
    }

    fn live(&self, key: &str, now: DateTime<Utc>) -> Option<&Slot> {
        self.map.get(key).filter(|slot| slot.expires_at > now)
    }
}

/// Mutex-guarded map with per-key expiry.
///
/// Expired slots are dropped when their key is touched again and in bulk
/// whenever the map grows past its sweep mark, so keys that are never read
/// again do not accumulate.
#[derive(Debug)]
pub struct InMemoryCache {
    slots: Mutex<Slots>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl InMemoryCache {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_sweep_threshold(clock, DEFAULT_SWEEP_THRESHOLD)
    }

    /// Creates a cache that sweeps once it holds `threshold` slots.
    #[must_use]
    pub fn with_sweep_threshold(clock: Arc<dyn Clock>, threshold: usize) -> Self {
        Self {
            slots: Mutex::new(Slots::new(threshold.max(1))),
            clock,
        }
    }

    /// Number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.slots
            .lock()
            .map
            .values()
            .filter(|slot| slot.expires_at > now)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every expired slot now. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        self.slots.lock().sweep(now)
    }

    /// Runs `f` on the live slot for `key`, dropping it first if expired.
    fn with_live_slot<R>(
        &self,
        key: &str,
        f: impl FnOnce(&mut Slots, Option<&Slot>, DateTime<Utc>) -> R,
    ) -> R {
        let now = self.clock.now();
        let mut slots = self.slots.lock();
        if slots.map.get(key).is_some_and(|slot| slot.expires_at <= now) {
            slots.map.remove(key);
        }
        let live = slots.map.get(key).cloned();
        f(&mut slots, live.as_ref(), now)
    }

    fn slot(&self, value: &str, ttl: Duration) -> Slot {
        Slot {
            value: value.to_string(),
            expires_at: add_duration(self.clock.now(), ttl),
        }
    }
}

#[async_trait]
impl CacheInterface for InMemoryCache {
    async fn get_raw(&self, key: &str) -> ItemCacheResult<Option<String>> {
        Ok(self.with_live_slot(key, |_, live, _| live.map(|slot| slot.value.clone())))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> ItemCacheResult<()> {
        let slot = self.slot(value, ttl);
        let now = self.clock.now();
        self.slots.lock().insert(key, slot, now);
        Ok(())
    }

    async fn delete(&self, key: &str) -> ItemCacheResult<bool> {
        Ok(self.with_live_slot(key, |slots, live, _| {
            slots.map.remove(key);
            live.is_some()
        }))
    }

    async fn delete_many(&self, keys: &[String]) -> ItemCacheResult<u64> {
        let now = self.clock.now();
        let mut slots = self.slots.lock();
        let mut deleted = 0;
        for key in keys {
            if slots.map.remove(key).is_some_and(|slot| slot.expires_at > now) {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> ItemCacheResult<bool> {
        let slot = self.slot(value, ttl);
        Ok(self.with_live_slot(key, |slots, live, now| {
            if live.is_some() {
                return false;
            }
            slots.insert(key, slot, now);
            true
        }))
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> ItemCacheResult<bool> {
        Ok(self.with_live_slot(key, |slots, live, _| match live {
            Some(slot) if slot.value == expected => {
                slots.map.remove(key);
                true
            }
            _ => false,
        }))
    }

    async fn compare_and_expire(&self, key: &str, expected: &str, ttl: Duration) -> ItemCacheResult<bool> {
        let expires_at = add_duration(self.clock.now(), ttl);
        Ok(self.with_live_slot(key, |slots, live, _| match live {
            Some(slot) if slot.value == expected => {
                if let Some(slot) = slots.map.get_mut(key) {
                    slot.expires_at = expires_at;
                }
                true
            }
            _ => false,
        }))
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
        let slot = self.slot(value, ttl);
        let written = self.with_live_slot(key, |slots, live, now| {
            let held = slots.live(lease_key, now).is_some_and(|lease| lease.value == owner);
            if !held || live.is_some_and(|existing| blocks_fill(&existing.value, version)) {
                return false;
            }
            slots.insert(key, slot, now);
            true
        });
        debug!("Fill of key '{}' at version {}: written={}", key, version, written);
        Ok(written)
    }

    async fn ping(&self) -> ItemCacheResult<()> {
        Ok(())
    }
}
