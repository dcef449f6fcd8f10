//! Item service trait definition.

use crate::dto::{ItemDto, ItemResponse};
use async_trait::async_trait;
use itemcache_core::{Interface, ItemCacheResult};

/// Item use cases exposed to the request layer.
#[async_trait]
pub trait ItemService: Interface + Send + Sync {
    /// Lists items, optionally filtered by a status name.
    async fn list_items(&self, status: Option<String>) -> ItemCacheResult<Vec<ItemResponse>>;

    /// Gets an item by key.
    async fn get_item(&self, key: &str) -> ItemCacheResult<ItemResponse>;

    /// Creates a new item under a freshly minted key.
    async fn create_item(&self, request: ItemDto) -> ItemCacheResult<ItemResponse>;

    /// Replaces an item's editable fields.
    async fn update_item(&self, key: &str, request: ItemDto) -> ItemCacheResult<ItemResponse>;

    /// Changes only an item's status.
    async fn update_item_status(&self, key: &str, status: &str) -> ItemCacheResult<ItemResponse>;

    /// Deletes an item. Deleting a missing item succeeds.
    async fn delete_item(&self, key: &str) -> ItemCacheResult<()>;
}
