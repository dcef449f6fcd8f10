//! Item entity and its structured payload.

use super::ItemStatus;
use crate::{ItemCacheError, ItemCacheResult, ItemKey, Version};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An item as committed in the store: key, opaque payload, and the version
/// the store assigned to the write that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub key: ItemKey,
    pub payload: serde_json::Value,
    pub version: Version,
}

impl Item {
    #[must_use]
    pub fn new(key: ItemKey, payload: serde_json::Value, version: Version) -> Self {
        Self {
            key,
            payload,
            version,
        }
    }

    /// Decodes the payload as [`ItemDetails`].
    pub fn details(&self) -> ItemCacheResult<ItemDetails> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            ItemCacheError::Internal(format!(
                "payload for item '{}' is not valid item details: {}",
                self.key, e
            ))
        })
    }
}

/// Descriptive fields the request layer stores in an item payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetails {
    pub status: ItemStatus,
    pub name: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub discontinued_at: Option<DateTime<Utc>>,
}

impl ItemDetails {
    /// Details for a brand-new item.
    #[must_use]
    pub fn new(name: String, summary: String, status: ItemStatus, now: DateTime<Utc>) -> Self {
        Self {
            status,
            name,
            summary,
            created_at: now,
            last_modified_at: now,
            discontinued_at: None,
        }
    }

    /// Full replacement of the editable fields.
    ///
    /// `discontinued_at` is stamped only when this update moves the item into
    /// `Discontinued`; any other update clears it.
    #[must_use]
    pub fn updated(
        &self,
        name: String,
        summary: String,
        status: ItemStatus,
        now: DateTime<Utc>,
    ) -> Self {
        let discontinued_at = (status == ItemStatus::Discontinued
            && self.status != ItemStatus::Discontinued)
            .then_some(now);

        Self {
            status,
            name,
            summary,
            created_at: self.created_at,
            last_modified_at: now,
            discontinued_at,
        }
    }

    /// Status-only change.
    #[must_use]
    pub fn with_status(&self, status: ItemStatus, now: DateTime<Utc>) -> Self {
        Self {
            status,
            name: self.name.clone(),
            summary: self.summary.clone(),
            created_at: self.created_at,
            last_modified_at: now,
            discontinued_at: (status == ItemStatus::Discontinued).then_some(now),
        }
    }

    /// Encodes the details as an item payload.
    pub fn to_payload(&self) -> ItemCacheResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Listing order: by status, then oldest first.
    #[must_use]
    pub fn listing_order(a: &Self, b: &Self) -> Ordering {
        ItemStatus::cmp_by_order(a.status, b.status).then_with(|| a.created_at.cmp(&b.created_at))
    }
}
