//! Item service implementations.
//!
//! Trait definitions live in the parent module (`item_service.rs`).

pub mod item_service_impl;

pub use item_service_impl::ItemServiceImpl;
