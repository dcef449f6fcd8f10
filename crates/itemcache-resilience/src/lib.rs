//! # Item Cache Resilience
//!
//! Resilience patterns for the item cache.
//! Provides retry with exponential backoff and per-call deadlines.

pub mod retry;
pub mod timeout;

pub use retry::*;
pub use timeout::*;
