//! Caching infrastructure for the service layer.
//!
//! The cache adapter abstraction with Redis and in-process implementations,
//! key naming, and the tagged cache line format.

mod cache_interface;
pub mod cache_keys;
mod entry;
mod memory_cache;
mod redis_cache;

pub use cache_interface::CacheInterface;
pub use cache_keys::CacheKeys;
pub use entry::{blocks_fill, CacheEntry, CachedValue, NegativeEntry};
pub use memory_cache::InMemoryCache;
pub use redis_cache::RedisCacheService;
