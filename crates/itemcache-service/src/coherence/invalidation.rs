//! Background retry of failed invalidations.
//!
//! A write whose cache delete failed is still reported as successful; its
//! line and lease keys land here and is retried with exponential backoff until it sticks
//! or the attempts run out. Until then readers may see the stale line for
//! at most its TTL.

use super::CoherenceMetrics;
use crate::cache::CacheInterface;
use itemcache_config::CacheConfig;
use itemcache_core::ItemCacheError;
use itemcache_resilience::{with_deadline, RetryPolicy};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

/// Invalidations waiting for a worker; beyond this they are dropped.
const QUEUE_CAPACITY: usize = 1024;

/// Handle for scheduling invalidation retries.
#[derive(Clone)]
pub struct InvalidationQueue {
    tx: mpsc::Sender<Vec<String>>,
}

impl InvalidationQueue {
    /// Starts the retry worker. Must be called inside a Tokio runtime.
    ///
    /// The worker stops once every handle has been dropped.
    #[must_use]
    pub fn spawn(cache: Arc<dyn CacheInterface>, settings: watch::Receiver<CacheConfig>) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        tokio::spawn(run(rx, cache, settings));
        Self { tx }
    }

    /// Schedules a retry deleting `cache_keys` together. Never blocks.
    pub fn schedule(&self, cache_keys: Vec<String>) {
        if let Err(e) = self.tx.try_send(cache_keys) {
            let cache_keys = match e {
                mpsc::error::TrySendError::Full(keys) | mpsc::error::TrySendError::Closed(keys) => keys,
            };
            error!(cache_keys = ?cache_keys, "Invalidation queue unavailable, giving up on keys");
            CoherenceMetrics::invalidation_failure();
        }
    }
}

async fn run(
    mut rx: mpsc::Receiver<Vec<String>>,
    cache: Arc<dyn CacheInterface>,
    settings: watch::Receiver<CacheConfig>,
) {
    while let Some(cache_keys) = rx.recv().await {
        let config = settings.borrow().clone();
        tokio::spawn(retry_invalidation(Arc::clone(&cache), cache_keys, config));
    }
    debug!("Invalidation queue closed");
}

async fn retry_invalidation(cache: Arc<dyn CacheInterface>, cache_keys: Vec<String>, config: CacheConfig) {
    let policy = RetryPolicy::with_max_attempts(config.invalidation_max_attempts)
        .initial_delay(config.invalidation_initial_backoff());
    let timeout = config.operation_timeout();

    // The caller's own attempt just failed; back off before the first retry.
    tokio::time::sleep(policy.delay_for_attempt(1)).await;

    let result = policy
        .execute(|| {
            CoherenceMetrics::invalidation_retry();
            let cache = Arc::clone(&cache);
            let cache_keys = cache_keys.clone();
            async move {
                with_deadline(timeout, cache.delete_many(&cache_keys), ItemCacheError::CacheUnavailable)
                    .await
            }
        })
        .await;

    match result {
        Ok(_) => info!(cache_keys = ?cache_keys, "Deferred invalidation succeeded"),
        Err(e) => {
            error!(
                cache_keys = ?cache_keys,
                attempts = policy.max_attempts,
                error = %e,
                "Giving up on invalidation; entry stays stale until its TTL"
            );
            CoherenceMetrics::invalidation_failure();
        }
    }
}
