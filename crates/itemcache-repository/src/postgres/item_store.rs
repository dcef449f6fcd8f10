//! PostgreSQL item store implementation.

use crate::{traits::ItemStore, DatabasePoolInterface};
use async_trait::async_trait;
use itemcache_core::{Item, ItemCacheError, ItemCacheResult, ItemKey, ItemStatus, Version};
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

/// PostgreSQL item store.
#[derive(Clone)]
pub struct PostgresItemStore {
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PostgresItemStore {
    /// Creates a new PostgreSQL item store.
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }

    async fn current_version(&self, key: &ItemKey) -> ItemCacheResult<Option<Version>> {
        let version: Option<i64> = sqlx::query_scalar("SELECT version FROM items WHERE key = $1")
            .bind(key.as_str())
            .fetch_optional(self.pool.inner())
            .await?;
        Ok(version.map(Version::new))
    }
}

/// Database row representation of an item.
#[derive(Debug, FromRow)]
struct ItemRow {
    key: String,
    payload: serde_json::Value,
    version: i64,
}

impl TryFrom<ItemRow> for Item {
    type Error = ItemCacheError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let key = ItemKey::parse(row.key)
            .map_err(|e| ItemCacheError::Internal(format!("Invalid key in database: {}", e)))?;
        Ok(Item::new(key, row.payload, Version::new(row.version)))
    }
}

#[async_trait]
impl ItemStore for PostgresItemStore {
    async fn find_by_key(&self, key: &ItemKey) -> ItemCacheResult<Option<Item>> {
        debug!("Finding item by key: {}", key);

        let row = sqlx::query_as::<_, ItemRow>(
            "SELECT key, payload, version FROM items WHERE key = $1",
        )
        .bind(key.as_str())
        .fetch_optional(self.pool.inner())
        .await?;

        row.map(Item::try_from).transpose()
    }

    async fn find_all(&self, status: Option<ItemStatus>) -> ItemCacheResult<Vec<Item>> {
        debug!("Listing items, status filter: {:?}", status);

        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, ItemRow>(
                    r#"
                    SELECT key, payload, version
                    FROM items
                    WHERE payload ->> 'status' = $1
                    ORDER BY created_at, key
                    "#,
                )
                .bind(status.as_str())
                .fetch_all(self.pool.inner())
                .await?
            }
            None => {
                sqlx::query_as::<_, ItemRow>(
                    "SELECT key, payload, version FROM items ORDER BY created_at, key",
                )
                .fetch_all(self.pool.inner())
                .await?
            }
        };

        rows.into_iter().map(Item::try_from).collect()
    }

    async fn put(&self, key: &ItemKey, payload: &serde_json::Value) -> ItemCacheResult<Version> {
        debug!("Upserting item: {}", key);

        let version: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO items (key, payload, version)
            VALUES ($1, $2, nextval('item_version_seq'))
            ON CONFLICT (key) DO UPDATE
            SET payload = EXCLUDED.payload,
                version = EXCLUDED.version,
                updated_at = now()
            RETURNING version
            "#,
        )
        .bind(key.as_str())
        .bind(payload)
        .fetch_one(self.pool.inner())
        .await?;

        Ok(Version::new(version))
    }

    async fn put_if_version(
        &self,
        key: &ItemKey,
        payload: &serde_json::Value,
        expected: Version,
    ) -> ItemCacheResult<Version> {
        debug!("Conditionally updating item {} at version {}", key, expected);

        let version: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE items
            SET payload = $2,
                version = nextval('item_version_seq'),
                updated_at = now()
            WHERE key = $1 AND version = $3
            RETURNING version
            "#,
        )
        .bind(key.as_str())
        .bind(payload)
        .bind(expected.get())
        .fetch_optional(self.pool.inner())
        .await?;

        match version {
            Some(version) => Ok(Version::new(version)),
            None => Err(ItemCacheError::VersionConflict {
                key: key.to_string(),
                expected,
                actual: self.current_version(key).await?,
            }),
        }
    }

    async fn delete(&self, key: &ItemKey) -> ItemCacheResult<bool> {
        debug!("Deleting item: {}", key);

        let result = sqlx::query("DELETE FROM items WHERE key = $1")
            .bind(key.as_str())
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
