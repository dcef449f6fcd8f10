//! # Item Cache Service
//!
//! Keeps the distributed cache coherent with the authoritative store.
//!
//! - [`cache`]: the cache adapter (Redis, in-process) and the tagged entry format
//! - [`lock`]: per-key fill leases built on the cache's atomic primitives
//! - [`coherence`]: read-through, invalidate-after-commit and the negative-result guard
//! - [`ItemService`]: the request-layer use cases on top of the engine

pub mod cache;
pub mod coherence;
pub mod dto;
pub mod item_service;
pub mod lock;
pub mod mappers;
pub mod r#impl;

pub use cache::*;
pub use coherence::*;
pub use dto::*;
pub use item_service::*;
pub use lock::*;
pub use r#impl::ItemServiceImpl;
