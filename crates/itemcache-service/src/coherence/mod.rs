//! Cache coherence.
//!
//! The engine owns every consistency decision between the store and the
//! cache. Cache entries are only written by a lease-holding reader, and
//! only with a version the store just returned; writers never populate the
//! cache, they delete the line after their commit.

mod engine;
mod invalidation;
pub mod metrics;

pub use engine::{CoherenceEngine, CoherenceEngineBuilder, Deletion, Lookup};
pub use invalidation::InvalidationQueue;
pub use metrics::{register_metrics, CoherenceMetrics};
