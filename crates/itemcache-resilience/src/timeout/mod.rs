//! Deadlines for calls to external dependencies.

use itemcache_core::{ItemCacheError, ItemCacheResult};
use std::future::Future;
use std::time::Duration;

/// Wraps a future with a timeout that surfaces as the caller's own error.
///
/// Used where an elapsed deadline must be classified like any other failure
/// of the same dependency, e.g. a slow store read is `StoreUnavailable`.
pub async fn with_deadline<Fut, T, E>(duration: Duration, fut: Fut, on_elapsed: E) -> ItemCacheResult<T>
where
    Fut: Future<Output = ItemCacheResult<T>>,
    E: FnOnce(String) -> ItemCacheError,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_elapsed(format!("timed out after {:?}", duration))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deadline_returns_value_in_time() {
        let result = with_deadline(
            Duration::from_secs(1),
            async { Ok::<_, ItemCacheError>(42) },
            ItemCacheError::CacheUnavailable,
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_maps_error() {
        let result = with_deadline(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, ItemCacheError>(())
            },
            ItemCacheError::StoreUnavailable,
        )
        .await;

        assert!(matches!(result, Err(ItemCacheError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_deadline_passes_inner_error_through() {
        let result: ItemCacheResult<()> = with_deadline(
            Duration::from_secs(1),
            async { Err(ItemCacheError::cache("down")) },
            ItemCacheError::StoreUnavailable,
        )
        .await;

        assert!(matches!(result, Err(ItemCacheError::CacheUnavailable(_))));
    }
}
