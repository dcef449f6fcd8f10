//! Cache key generators for consistent key naming.

use itemcache_core::ItemKey;

/// Default namespace for cache and lease keys.
pub const DEFAULT_PREFIX: &str = "itemcache";

/// Builds namespaced cache keys.
#[derive(Debug, Clone)]
pub struct CacheKeys {
    prefix: String,
}

impl Default for CacheKeys {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl CacheKeys {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Key of the cache line (entry or tombstone) for an item.
    #[must_use]
    pub fn item(&self, key: &ItemKey) -> String {
        format!("{}:item:{}", self.prefix, key)
    }

    /// Key of the fill lease for an item.
    #[must_use]
    pub fn lease(&self, key: &ItemKey) -> String {
        format!("{}:lease:{}", self.prefix, key)
    }
}
