//! Per-key fill leases.
//!
//! A lease is the right to be the one process populating the cache for a
//! key. Leases expire on their own, so a crashed holder delays other readers
//! by at most the lease TTL. A committed write deletes the lease of its key,
//! which revokes any fill still in flight.

mod cache_lease_lock;

pub use cache_lease_lock::CacheLeaseLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use itemcache_core::{Interface, ItemCacheResult, ItemKey};
use std::time::Duration;

/// A held lease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillLease {
    pub key: ItemKey,
    /// Unique token of this acquisition; release and renew match on it.
    pub owner: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of an acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseOutcome {
    Acquired(FillLease),
    /// Another owner holds a live lease.
    Busy,
}

/// Distributed mutual exclusion scoped to one item key.
///
/// At most one live lease exists per key across all processes.
#[async_trait]
pub trait DistributedLock: Interface + Send + Sync {
    /// Tries once to take the lease; never waits.
    async fn try_acquire(&self, key: &ItemKey, ttl: Duration) -> ItemCacheResult<LeaseOutcome>;

    /// Extends a held lease. Returns `false` if it already expired or changed hands.
    async fn renew(&self, lease: &mut FillLease, ttl: Duration) -> ItemCacheResult<bool>;

    /// Gives the lease back. Returns `false` if it already expired or changed hands.
    async fn release(&self, lease: &FillLease) -> ItemCacheResult<bool>;
}
