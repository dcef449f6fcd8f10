//! Cache line format.
//!
//! Every value the engine writes is a [`CachedValue`], tagged with `kind` so
//! a positive line and a not-found marker can never be mistaken for each
//! other.

use chrono::{DateTime, Utc};
use itemcache_core::{Item, ItemKey, Version};
use serde::{Deserialize, Serialize};

/// Cached copy of a committed item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: ItemKey,
    pub payload: serde_json::Value,
    pub version: Version,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    #[must_use]
    pub fn from_item(item: &Item, cached_at: DateTime<Utc>) -> Self {
        Self {
            key: item.key.clone(),
            payload: item.payload.clone(),
            version: item.version,
            cached_at,
        }
    }

    #[must_use]
    pub fn into_item(self) -> Item {
        Item::new(self.key, self.payload, self.version)
    }
}

/// Tombstone: the store had no item under `key` when this was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegativeEntry {
    pub key: ItemKey,
    pub expires_at: DateTime<Utc>,
}

impl NegativeEntry {
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// A cache line as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CachedValue {
    Item(CacheEntry),
    Missing(NegativeEntry),
}

impl CachedValue {
    /// Version used for conditional fills. Tombstones rank below every item.
    #[must_use]
    pub fn fill_version(&self) -> i64 {
        match self {
            Self::Item(entry) => entry.version.get(),
            Self::Missing(_) => 0,
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Whether an existing cache line must survive a fill at `incoming_version`.
///
/// Only a positive line at the same or a newer version wins; anything that
/// does not decode is overwritten. Mirrors the Redis fill script.
#[must_use]
pub fn blocks_fill(existing: &str, incoming_version: i64) -> bool {
    matches!(
        CachedValue::decode(existing),
        Ok(CachedValue::Item(entry)) if entry.version.get() >= incoming_version
    )
}
