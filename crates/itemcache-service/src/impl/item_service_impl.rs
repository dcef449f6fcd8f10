//! Item service implementation on top of the coherence engine.

use crate::coherence::{CoherenceEngine, Deletion, Lookup};
use crate::dto::{ItemDto, ItemResponse};
use crate::item_service::ItemService;
use async_trait::async_trait;
use itemcache_config::WritePolicy;
use itemcache_core::{
    Clock, Item, ItemCacheError, ItemCacheResult, ItemDetails, ItemKey, ItemStatus, SystemClock,
    ValidateExt, Version,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Item service backed by a [`CoherenceEngine`].
pub struct ItemServiceImpl {
    engine: Arc<CoherenceEngine>,
    clock: Arc<dyn Clock>,
}

impl ItemServiceImpl {
    /// Creates a new item service.
    #[must_use]
    pub fn new(engine: Arc<CoherenceEngine>) -> Self {
        Self::with_clock(engine, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(engine: Arc<CoherenceEngine>, clock: Arc<dyn Clock>) -> Self {
        Self { engine, clock }
    }

    async fn load(&self, key: &ItemKey) -> ItemCacheResult<Item> {
        match self.engine.get(key).await? {
            Lookup::Found(item) => Ok(item),
            Lookup::NotFound => Err(ItemCacheError::not_found("Item", key)),
        }
    }

    /// Writes under the configured policy. `read` is the version the
    /// replaced details were derived from, if any.
    async fn write(
        &self,
        key: &ItemKey,
        details: &ItemDetails,
        read: Option<Version>,
    ) -> ItemCacheResult<Version> {
        let payload = details.to_payload()?;
        match (self.engine.settings().write_policy, read) {
            (WritePolicy::Optimistic, Some(expected)) => {
                self.engine.put_versioned(key, &payload, expected).await
            }
            _ => self.engine.put(key, &payload).await,
        }
    }
}

fn parse_status(raw: &str) -> ItemCacheResult<ItemStatus> {
    raw.parse()
}

#[async_trait]
impl ItemService for ItemServiceImpl {
    async fn list_items(&self, status: Option<String>) -> ItemCacheResult<Vec<ItemResponse>> {
        let status = status.as_deref().map(parse_status).transpose()?;
        debug!("Listing items, status: {:?}", status);

        let items = self.engine.list(status).await?;
        let mut rows = items
            .iter()
            .map(|item| item.details().map(|details| (item, details)))
            .collect::<ItemCacheResult<Vec<_>>>()?;
        rows.sort_by(|(_, a), (_, b)| ItemDetails::listing_order(a, b));

        Ok(rows
            .into_iter()
            .map(|(item, details)| ItemResponse::from_parts(item.key.clone(), item.version, details))
            .collect())
    }

    async fn get_item(&self, key: &str) -> ItemCacheResult<ItemResponse> {
        debug!("Getting item: {}", key);

        let key = ItemKey::parse(key)?;
        let item = self.load(&key).await?;
        ItemResponse::try_from(&item)
    }

    async fn create_item(&self, request: ItemDto) -> ItemCacheResult<ItemResponse> {
        debug!("Creating item: {}", request.name);

        request.validate_request()?;
        let status = request
            .status
            .as_deref()
            .map(parse_status)
            .transpose()?
            .unwrap_or_default();

        let key = ItemKey::generate();
        let details = ItemDetails::new(
            request.name,
            request.description.unwrap_or_default(),
            status,
            self.clock.now(),
        );
        let version = self.engine.put(&key, &details.to_payload()?).await?;

        info!("Item created: {} (version {})", key, version);
        Ok(ItemResponse::from_parts(key, version, details))
    }

    async fn update_item(&self, key: &str, request: ItemDto) -> ItemCacheResult<ItemResponse> {
        debug!("Updating item: {}", key);

        let key = ItemKey::parse(key)?;
        request.validate_request()?;
        let requested_status = request.status.as_deref().map(parse_status).transpose()?;

        let current = self.load(&key).await?;
        let existing = current.details()?;
        let details = existing.updated(
            request.name,
            request.description.unwrap_or_default(),
            requested_status.unwrap_or(existing.status),
            self.clock.now(),
        );

        let read = request.version.unwrap_or(current.version);
        let version = self.write(&key, &details, Some(read)).await?;

        info!("Item updated: {} (version {})", key, version);
        Ok(ItemResponse::from_parts(key, version, details))
    }

    async fn update_item_status(&self, key: &str, status: &str) -> ItemCacheResult<ItemResponse> {
        debug!("Updating item status: {} -> {}", key, status);

        let key = ItemKey::parse(key)?;
        let status = parse_status(status)?;

        let current = self.load(&key).await?;
        let details = current.details()?.with_status(status, self.clock.now());
        let version = self.write(&key, &details, Some(current.version)).await?;

        info!("Item status updated: {} -> {}", key, status);
        Ok(ItemResponse::from_parts(key, version, details))
    }

    async fn delete_item(&self, key: &str) -> ItemCacheResult<()> {
        debug!("Deleting item: {}", key);

        let key = ItemKey::parse(key)?;
        match self.engine.delete(&key).await? {
            Deletion::Deleted => info!("Item deleted: {}", key),
            Deletion::NotFound => debug!("Item {} was already absent", key),
        }
        Ok(())
    }
}

impl std::fmt::Debug for ItemServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemServiceImpl")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
