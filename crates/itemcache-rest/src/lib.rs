//! # Item Cache REST
//!
//! REST API layer using Axum.
//! Exposes the item endpoints under `/api/v1` plus health and readiness checks.

pub mod controllers;
pub mod middleware;
pub mod openapi;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
