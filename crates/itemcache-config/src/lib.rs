//! # Item Cache Config
//!
//! Configuration management for the item cache.
//! Supports layered configuration from files, environment variables,
//! and runtime refresh of the cache tuning knobs.

mod app_config;
mod loader;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use validation::*;
