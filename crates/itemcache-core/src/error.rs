//! Unified error types for all layers of the item cache.

use crate::Version;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for the item cache.
///
/// The infrastructure variants mirror the coherence taxonomy: store failures
/// are fatal to the current call, cache and lock failures are absorbed by the
/// engine and only surface from the adapters themselves.
#[derive(Error, Debug)]
pub enum ItemCacheError {
    // ============ Domain Errors ============
    /// Resource not found
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown or blank item status
    #[error("Invalid item status: {0}")]
    InvalidStatus(String),

    /// Optimistic write rejected because the stored version moved on
    #[error("Version conflict for key '{key}': expected {expected}, found {}", display_actual(.actual))]
    VersionConflict {
        key: String,
        expected: Version,
        actual: Option<Version>,
    },

    // ============ Infrastructure Errors ============
    /// Relational store failed or did not answer in time
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Distributed cache unreachable or failed the command
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Lease could not be acquired or released
    #[error("Lock unavailable: {0}")]
    LockUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn display_actual(actual: &Option<Version>) -> String {
    actual.map_or_else(|| "no item".to_string(), |v| v.to_string())
}

impl ItemCacheError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Validation(_) | Self::InvalidStatus(_) => 400,
            Self::VersionConflict { .. } => 409,
            Self::StoreUnavailable(_) => 503,
            Self::CacheUnavailable(_)
            | Self::LockUnavailable(_)
            | Self::Configuration(_)
            | Self::Internal(_)
            | Self::Other(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidStatus(_) => "INVALID_STATUS",
            Self::VersionConflict { .. } => "VERSION_CONFLICT",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::CacheUnavailable(_) => "CACHE_UNAVAILABLE",
            Self::LockUnavailable(_) => "LOCK_UNAVAILABLE",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a store failure.
    #[must_use]
    pub fn store<T: Into<String>>(message: T) -> Self {
        Self::StoreUnavailable(message.into())
    }

    /// Creates a cache failure.
    #[must_use]
    pub fn cache<T: Into<String>>(message: T) -> Self {
        Self::CacheUnavailable(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Checks if this error is retriable by the caller.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_) | Self::CacheUnavailable(_) | Self::LockUnavailable(_)
        )
    }

    /// Checks if this error came from the cache tier (cache or lease store).
    #[must_use]
    pub const fn is_cache_failure(&self) -> bool {
        matches!(self, Self::CacheUnavailable(_) | Self::LockUnavailable(_))
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for ItemCacheError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound {
                resource_type: "database_row",
                id: "unknown".to_string(),
            },
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::Internal(format!("Failed to decode row: {}", err))
            }
            _ => Self::StoreUnavailable(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ItemCacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization error: {}", err))
    }
}

/// Serializable error response for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// When the error was produced
    pub timestamp: DateTime<Utc>,
    /// Request path, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorResponse {
    /// Creates a new error response from an `ItemCacheError`.
    #[must_use]
    pub fn from_error(error: &ItemCacheError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
            timestamp: Utc::now(),
            path: None,
        }
    }

    /// Sets the request path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl From<&ItemCacheError> for ErrorResponse {
    fn from(error: &ItemCacheError) -> Self {
        Self::from_error(error)
    }
}
