//! # Item Cache Server Library
//!
//! Wiring and startup utilities for the item cache server binary.

pub mod di;
pub mod startup;
