//! # Item Cache Core
//!
//! Core types, domain model, and error definitions shared by every layer of
//! the item cache service: the store adapter, the cache adapter, the
//! coherence engine, and the REST surface.

pub mod clock;
pub mod domain;
pub mod error;
pub mod id;
pub mod result;
pub mod telemetry;
pub mod validation;

pub use clock::*;
pub use domain::*;
pub use error::*;
pub use id::*;
pub use result::*;
pub use validation::*;

// Re-export shaku so adapter traits share one `Interface` bound
pub use shaku::Interface;
