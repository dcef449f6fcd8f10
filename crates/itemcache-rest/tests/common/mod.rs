//! Router fixtures backed by an in-memory store and cache.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, Router};
use http_body_util::BodyExt;
use itemcache_config::{CacheConfig, ServerConfig};
use itemcache_core::{Item, ItemCacheError, ItemCacheResult, ItemKey, ItemStatus, Version};
use itemcache_repository::ItemStore;
use itemcache_rest::{create_router, AppState, DependencyCheck};
use itemcache_service::{CoherenceEngine, InMemoryCache, ItemServiceImpl};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tower::ServiceExt;

#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<ItemKey, Item>>,
    next_version: Mutex<i64>,
}

impl MemoryStore {
    fn bump(&self) -> Version {
        let mut next = self.next_version.lock().unwrap();
        *next += 1;
        Version::new(*next)
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn find_by_key(&self, key: &ItemKey) -> ItemCacheResult<Option<Item>> {
        Ok(self.items.lock().unwrap().get(key).cloned())
    }

    async fn find_all(&self, status: Option<ItemStatus>) -> ItemCacheResult<Vec<Item>> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|item| status.map_or(true, |s| item.details().map_or(false, |d| d.status == s)))
            .cloned()
            .collect())
    }

    async fn put(&self, key: &ItemKey, payload: &serde_json::Value) -> ItemCacheResult<Version> {
        let version = self.bump();
        self.items
            .lock()
            .unwrap()
            .insert(key.clone(), Item::new(key.clone(), payload.clone(), version));
        Ok(version)
    }

    async fn put_if_version(
        &self,
        key: &ItemKey,
        payload: &serde_json::Value,
        expected: Version,
    ) -> ItemCacheResult<Version> {
        let actual = self.items.lock().unwrap().get(key).map(|item| item.version);
        if actual != Some(expected) {
            return Err(ItemCacheError::VersionConflict {
                key: key.to_string(),
                expected,
                actual,
            });
        }
        self.put(key, payload).await
    }

    async fn delete(&self, key: &ItemKey) -> ItemCacheResult<bool> {
        Ok(self.items.lock().unwrap().remove(key).is_some())
    }
}

/// Readiness check with a switchable outcome.
pub struct Toggle {
    pub name: &'static str,
    pub up: AtomicBool,
}

impl Toggle {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            up: AtomicBool::new(true),
        })
    }
}

#[async_trait]
impl DependencyCheck for Toggle {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn check(&self) -> ItemCacheResult<()> {
        if self.up.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ItemCacheError::cache("unreachable"))
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub cache_check: Arc<Toggle>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_settings(CacheConfig::default())
    }

    pub fn with_settings(settings: CacheConfig) -> Self {
        let (_tx, rx) = watch::channel(settings);
        let engine = CoherenceEngine::builder(
            Arc::new(MemoryStore::default()),
            Arc::new(InMemoryCache::default()),
            rx,
        )
        .build();
        let service = Arc::new(ItemServiceImpl::new(Arc::new(engine)));

        let store_check = Toggle::new("store");
        let cache_check = Toggle::new("cache");
        let checks: Vec<Arc<dyn DependencyCheck>> = vec![
            store_check as Arc<dyn DependencyCheck>,
            cache_check.clone() as Arc<dyn DependencyCheck>,
        ];
        let state = AppState::new(service, checks);

        Self {
            router: create_router(state, &ServerConfig::default()),
            cache_check,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
