//! Prometheus metrics for cache coherence.

use metrics::{counter, describe_counter};

/// Metric names for the coherence engine.
pub mod names {
    /// Reads answered from a positive cache entry.
    pub const CACHE_HITS_TOTAL: &str = "itemcache_cache_hits_total";
    /// Reads answered from a live negative entry.
    pub const CACHE_NEGATIVE_HITS_TOTAL: &str = "itemcache_cache_negative_hits_total";
    /// Reads that found no usable cache line.
    pub const CACHE_MISSES_TOTAL: &str = "itemcache_cache_misses_total";
    /// Cache lines written by a lease holder.
    pub const CACHE_FILLS_TOTAL: &str = "itemcache_cache_fills_total";
    /// Fills dropped because the lease was lost during the store read.
    pub const CACHE_FILLS_ABANDONED_TOTAL: &str = "itemcache_cache_fills_abandoned_total";
    /// Point reads issued to the store.
    pub const STORE_READS_TOTAL: &str = "itemcache_store_reads_total";
    /// Reads served straight from the store without touching the cache.
    pub const FALLBACK_READS_TOTAL: &str = "itemcache_fallback_reads_total";
    /// Background invalidation attempts after a failed delete.
    pub const INVALIDATION_RETRIES_TOTAL: &str = "itemcache_invalidation_retries_total";
    /// Invalidations abandoned after every retry failed.
    pub const INVALIDATION_FAILURES_TOTAL: &str = "itemcache_invalidation_failures_total";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(names::CACHE_HITS_TOTAL, "Reads answered from a cached item");
    describe_counter!(
        names::CACHE_NEGATIVE_HITS_TOTAL,
        "Reads answered from a cached not-found marker"
    );
    describe_counter!(names::CACHE_MISSES_TOTAL, "Reads with no usable cache line");
    describe_counter!(names::CACHE_FILLS_TOTAL, "Cache lines written after a store read");
    describe_counter!(
        names::CACHE_FILLS_ABANDONED_TOTAL,
        "Fills dropped after the lease expired or was revoked by a write"
    );
    describe_counter!(names::STORE_READS_TOTAL, "Point reads issued to the store");
    describe_counter!(
        names::FALLBACK_READS_TOTAL,
        "Reads served directly from the store, bypassing the cache"
    );
    describe_counter!(
        names::INVALIDATION_RETRIES_TOTAL,
        "Background retries of failed cache invalidations"
    );
    describe_counter!(
        names::INVALIDATION_FAILURES_TOTAL,
        "Cache invalidations abandoned after all retries"
    );
}

/// Coherence metrics recorder.
#[derive(Clone)]
pub struct CoherenceMetrics;

impl CoherenceMetrics {
    pub fn hit() {
        counter!(names::CACHE_HITS_TOTAL).increment(1);
    }

    pub fn negative_hit() {
        counter!(names::CACHE_NEGATIVE_HITS_TOTAL).increment(1);
    }

    pub fn miss() {
        counter!(names::CACHE_MISSES_TOTAL).increment(1);
    }

    /// Record a fill; `kind` is `item` or `missing`.
    pub fn fill(kind: &'static str) {
        counter!(names::CACHE_FILLS_TOTAL, "kind" => kind).increment(1);
    }

    pub fn fill_abandoned() {
        counter!(names::CACHE_FILLS_ABANDONED_TOTAL).increment(1);
    }

    pub fn store_read() {
        counter!(names::STORE_READS_TOTAL).increment(1);
    }

    /// Record a direct store read; `reason` says why the cache was skipped.
    pub fn fallback_read(reason: &'static str) {
        counter!(names::FALLBACK_READS_TOTAL, "reason" => reason).increment(1);
    }

    pub fn invalidation_retry() {
        counter!(names::INVALIDATION_RETRIES_TOTAL).increment(1);
    }

    pub fn invalidation_failure() {
        counter!(names::INVALIDATION_FAILURES_TOTAL).increment(1);
    }
}
