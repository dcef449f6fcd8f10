//! PostgreSQL store implementations.

mod item_store;

pub use item_store::PostgresItemStore;
