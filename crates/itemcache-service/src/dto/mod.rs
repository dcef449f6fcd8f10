//! Data Transfer Objects (DTOs).

mod item_dto;

pub use item_dto::*;
