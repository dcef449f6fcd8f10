//! Item lifecycle status.

use crate::ItemCacheError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Whether an item is still offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    /// Item is current.
    #[default]
    Current,
    /// Item has been discontinued.
    Discontinued,
}

impl ItemStatus {
    /// Listing order: current items before discontinued ones.
    #[must_use]
    pub const fn sort_order(self) -> u8 {
        match self {
            Self::Current => 0,
            Self::Discontinued => 1,
        }
    }

    /// Compares two statuses by listing order.
    #[must_use]
    pub fn cmp_by_order(a: Self, b: Self) -> Ordering {
        a.sort_order().cmp(&b.sort_order())
    }

    /// Canonical wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Current => "CURRENT",
            Self::Discontinued => "DISCONTINUED",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = ItemCacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ItemCacheError::InvalidStatus(
                "item status cannot be blank".to_string(),
            ));
        }
        match s.trim().to_uppercase().as_str() {
            "CURRENT" => Ok(Self::Current),
            "DISCONTINUED" => Ok(Self::Discontinued),
            _ => Err(ItemCacheError::InvalidStatus(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("current".parse::<ItemStatus>().unwrap(), ItemStatus::Current);
        assert_eq!("Discontinued".parse::<ItemStatus>().unwrap(), ItemStatus::Discontinued);
    }

    #[test]
    fn test_parse_rejects_blank_and_unknown() {
        assert!(matches!("".parse::<ItemStatus>(), Err(ItemCacheError::InvalidStatus(_))));
        assert!(matches!("archived".parse::<ItemStatus>(), Err(ItemCacheError::InvalidStatus(_))));
    }

    #[test]
    fn test_sort_order() {
        assert_eq!(
            ItemStatus::cmp_by_order(ItemStatus::Current, ItemStatus::Discontinued),
            Ordering::Less
        );
    }

    #[test]
    fn test_serde_uses_upper_case() {
        assert_eq!(serde_json::to_string(&ItemStatus::Discontinued).unwrap(), "\"DISCONTINUED\"");
    }
}
