//! Typed identifiers: item keys and store-assigned versions.

use crate::{ItemCacheError, ItemCacheResult};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use uuid::Uuid;

/// Opaque item identity, used verbatim as the store primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct ItemKey(String);

impl ItemKey {
    /// Longest key accepted (matches the `items.key` column).
    pub const MAX_LEN: usize = 255;

    /// Parses and validates a key.
    pub fn parse(raw: impl Into<String>) -> ItemCacheResult<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ItemCacheError::validation("item key must not be blank"));
        }
        if raw.len() > Self::MAX_LEN {
            return Err(ItemCacheError::validation(format!(
                "item key exceeds {} bytes",
                Self::MAX_LEN
            )));
        }
        Ok(Self(raw))
    }

    /// Mints a fresh, time-ordered key for a newly created item.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Store-assigned write generation.
///
/// Drawn from one database sequence, so two writes never share a version and
/// a larger version is always the later write for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Wraps a raw version value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}
