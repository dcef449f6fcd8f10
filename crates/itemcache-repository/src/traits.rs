//! Store adapter trait.

use async_trait::async_trait;
use itemcache_core::{Interface, Item, ItemCacheResult, ItemKey, ItemStatus, Version};

/// Point access to the authoritative item store.
///
/// A missing item is `Ok(None)` / `Ok(false)`; `Err` always means the store
/// itself failed.
#[async_trait]
pub trait ItemStore: Interface + Send + Sync {
    /// Reads one item.
    async fn find_by_key(&self, key: &ItemKey) -> ItemCacheResult<Option<Item>>;

    /// Lists items, oldest first, optionally restricted to one status.
    async fn find_all(&self, status: Option<ItemStatus>) -> ItemCacheResult<Vec<Item>>;

    /// Inserts or replaces the item and returns the version of this write.
    async fn put(&self, key: &ItemKey, payload: &serde_json::Value) -> ItemCacheResult<Version>;

    /// Replaces the item only if its current version is `expected`.
    ///
    /// Fails with `VersionConflict` when the item moved on or no longer exists.
    async fn put_if_version(
        &self,
        key: &ItemKey,
        payload: &serde_json::Value,
        expected: Version,
    ) -> ItemCacheResult<Version>;

    /// Deletes the item. Returns whether a row was removed.
    async fn delete(&self, key: &ItemKey) -> ItemCacheResult<bool>;
}
