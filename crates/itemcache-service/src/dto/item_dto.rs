//! Item-related DTOs.

use chrono::{DateTime, Utc};
use itemcache_core::{ItemKey, ItemStatus, Version};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating or replacing an item.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ItemDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Case-insensitive status name. Defaults to `CURRENT` on create and to
    /// the stored status on update.
    pub status: Option<String>,

    #[validate(length(max = 4000, message = "Description cannot exceed 4000 characters"))]
    pub description: Option<String>,

    /// Version the client last read; checked under the optimistic write policy.
    pub version: Option<Version>,
}

/// Item response DTO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub key: ItemKey,
    pub name: String,
    pub description: String,
    pub status: ItemStatus,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub discontinued_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use itemcache_core::{ItemCacheError, ValidateExt};

    fn dto(name: &str) -> ItemDto {
        ItemDto {
            name: name.to_string(),
            status: None,
            description: None,
            version: None,
        }
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(matches!(dto("").validate_request(), Err(ItemCacheError::Validation(_))));
        assert!(dto("Widget").validate_request().is_ok());
    }

    #[test]
    fn test_long_description_rejected() {
        let mut request = dto("Widget");
        request.description = Some("d".repeat(4001));
        assert!(request.validate_request().is_err());
    }

    #[test]
    fn test_minimal_body_deserializes() {
        let request: ItemDto = serde_json::from_str(r#"{"name":"Widget"}"#).unwrap();
        assert!(request.status.is_none());
        assert!(request.version.is_none());
    }
}
