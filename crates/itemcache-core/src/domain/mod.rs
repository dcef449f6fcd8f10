//! Domain model: items as the store sees them and the structured details the
//! request layer keeps in an item's payload.

mod item;
mod status;

pub use item::*;
pub use status::*;
