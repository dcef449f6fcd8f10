//! Dependency wiring.
//!
//! Builds the adapters from configuration and hands them to the coherence
//! engine and the item service. Everything is created once at startup.

use deadpool_redis::{Config as RedisPoolConfig, PoolConfig, Runtime};
use itemcache_config::{AppConfig, CacheConfig, RedisConfig};
use itemcache_core::{ItemCacheError, ItemCacheResult};
use itemcache_repository::{create_pool, DatabasePool, DatabasePoolInterface, PostgresItemStore};
use itemcache_rest::{AppState, CacheCheck, DependencyCheck, StoreCheck};
use itemcache_service::{
    CacheInterface, CacheKeys, CoherenceEngine, InMemoryCache, ItemService, ItemServiceImpl,
    RedisCacheService,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Everything the server needs, fully wired.
pub struct AppContainer {
    pub pool: Arc<DatabasePool>,
    pub cache: Arc<dyn CacheInterface>,
    pub engine: Arc<CoherenceEngine>,
    pub item_service: Arc<dyn ItemService>,
}

impl AppContainer {
    /// Connects to the store and the cache and wires the services.
    ///
    /// `cache_settings` is the live cache tuning; later values reach the
    /// engine without a restart.
    pub async fn build(
        config: &AppConfig,
        cache_settings: watch::Receiver<CacheConfig>,
    ) -> ItemCacheResult<Self> {
        let pool = create_pool(&config.database).await?;
        if config.database.run_migrations {
            pool.run_migrations().await?;
        }

        let cache = create_cache(&config.redis)?;
        let store = Arc::new(PostgresItemStore::new(pool.clone()));

        let engine = Arc::new(
            CoherenceEngine::builder(store, Arc::clone(&cache), cache_settings)
                .keys(CacheKeys::new(config.redis.key_prefix.clone()))
                .build(),
        );
        let item_service: Arc<dyn ItemService> = Arc::new(ItemServiceImpl::new(Arc::clone(&engine)));

        info!("Application container built");
        Ok(Self {
            pool,
            cache,
            engine,
            item_service,
        })
    }

    /// REST state with readiness checks on the store and the cache.
    #[must_use]
    pub fn app_state(&self) -> AppState {
        let checks: Vec<Arc<dyn DependencyCheck>> = vec![
            Arc::new(StoreCheck(self.pool.clone())),
            Arc::new(CacheCheck(Arc::clone(&self.cache))),
        ];
        AppState::new(Arc::clone(&self.item_service), checks)
    }

    /// Closes pooled connections.
    pub async fn shutdown(&self) {
        self.pool.close().await;
    }
}

/// Creates the cache adapter: Redis when enabled, otherwise an in-process
/// cache whose coherence guarantees cover this process only.
pub fn create_cache(config: &RedisConfig) -> ItemCacheResult<Arc<dyn CacheInterface>> {
    if !config.enabled {
        warn!("Redis disabled; using in-process cache, coherence is local to this instance");
        return Ok(Arc::new(InMemoryCache::default()));
    }

    let mut redis_config = RedisPoolConfig::from_url(&config.url);
    redis_config.pool = Some(PoolConfig::new(config.pool_size as usize));
    let pool = redis_config
        .create_pool(Some(Runtime::Tokio1))
        .map_err(|e| ItemCacheError::Configuration(format!("Failed to create Redis pool: {}", e)))?;

    info!("Redis cache pool created (size {})", config.pool_size);
    Ok(Arc::new(RedisCacheService::new(Arc::new(pool))))
}
