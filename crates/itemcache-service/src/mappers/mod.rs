//! Entity-DTO mappers.

use crate::dto::ItemResponse;
use itemcache_core::{Item, ItemCacheResult, ItemDetails, ItemKey, Version};

impl ItemResponse {
    /// Builds a response from already decoded details.
    #[must_use]
    pub fn from_parts(key: ItemKey, version: Version, details: ItemDetails) -> Self {
        Self {
            key,
            name: details.name,
            description: details.summary,
            status: details.status,
            version,
            created_at: details.created_at,
            last_modified_at: details.last_modified_at,
            discontinued_at: details.discontinued_at,
        }
    }
}

impl TryFrom<&Item> for ItemResponse {
    type Error = itemcache_core::ItemCacheError;

    fn try_from(item: &Item) -> ItemCacheResult<Self> {
        Ok(Self::from_parts(item.key.clone(), item.version, item.details()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use itemcache_core::ItemStatus;

    #[test]
    fn test_item_to_response() {
        let details = ItemDetails::new(
            "Widget".to_string(),
            "A widget".to_string(),
            ItemStatus::Current,
            Utc::now(),
        );
        let item = Item::new(
            ItemKey::parse("w-1").unwrap(),
            details.to_payload().unwrap(),
            Version::new(9),
        );

        let response = ItemResponse::try_from(&item).unwrap();
        assert_eq!(response.key.as_str(), "w-1");
        assert_eq!(response.description, "A widget");
        assert_eq!(response.version, Version::new(9));
        assert_eq!(response.created_at, details.created_at);
    }

    #[test]
    fn test_foreign_payload_is_internal_error() {
        let item = Item::new(ItemKey::parse("x").unwrap(), serde_json::json!(1), Version::new(1));
        assert!(ItemResponse::try_from(&item).is_err());
    }
}
