//! Application state for Axum handlers.

use async_trait::async_trait;
use itemcache_core::ItemCacheResult;
use itemcache_repository::DatabasePoolInterface;
use itemcache_service::{CacheInterface, ItemService};
use std::sync::Arc;

/// A dependency the readiness probe must reach.
#[async_trait]
pub trait DependencyCheck: Send + Sync {
    /// Name reported in the readiness body.
    fn name(&self) -> &'static str;

    async fn check(&self) -> ItemCacheResult<()>;
}

/// Readiness of the relational store.
pub struct StoreCheck(pub Arc<dyn DatabasePoolInterface>);

#[async_trait]
impl DependencyCheck for StoreCheck {
    fn name(&self) -> &'static str {
        "store"
    }

    async fn check(&self) -> ItemCacheResult<()> {
        self.0.health_check().await
    }
}

/// Readiness of the cache backend.
pub struct CacheCheck(pub Arc<dyn CacheInterface>);

#[async_trait]
impl DependencyCheck for CacheCheck {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn check(&self) -> ItemCacheResult<()> {
        self.0.ping().await
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub item_service: Arc<dyn ItemService>,
    pub checks: Arc<[Arc<dyn DependencyCheck>]>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(item_service: Arc<dyn ItemService>, checks: Vec<Arc<dyn DependencyCheck>>) -> Self {
        Self {
            item_service,
            checks: checks.into(),
        }
    }
}
