//! # Item Cache Repository
//!
//! The authoritative store behind the cache:
//!
//! ```text
//! CoherenceEngine
//!   ↓  Arc<dyn ItemStore>     (store adapter interface)
//! PostgresItemStore           (SQLx)
//!   ↓
//! PostgreSQL (items table, item_version_seq)
//! ```

pub mod pool;
pub mod postgres;
pub mod traits;

pub use pool::*;
pub use postgres::*;
pub use traits::*;
