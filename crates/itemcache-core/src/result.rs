//! Result type aliases for the item cache.

use crate::ItemCacheError;

/// A specialized `Result` type for item cache operations.
pub type ItemCacheResult<T> = Result<T, ItemCacheError>;
