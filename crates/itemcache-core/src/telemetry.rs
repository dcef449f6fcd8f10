//! Logging initialisation.
//!
//! Installs a global `tracing` subscriber. `RUST_LOG` wins over the
//! configured level when set.

use crate::ItemCacheResult;
use serde::{Deserialize, Serialize};

#[cfg(feature = "telemetry")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, one event per line.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Default filter directives when neither `RUST_LOG` nor a level is given.
pub const DEFAULT_FILTER: &str = "info,itemcache=debug,tower_http=debug";

/// Builds the filter directive string for a base level.
#[must_use]
pub fn filter_directives(level: &str) -> String {
    if level.trim().is_empty() {
        DEFAULT_FILTER.to_string()
    } else {
        format!("{},itemcache={},tower_http=debug", level, level)
    }
}

/// Installs the global subscriber.
#[cfg(feature = "telemetry")]
pub fn init_logging(level: &str, format: LogFormat) -> ItemCacheResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directives(level)))
        .map_err(|e| crate::ItemCacheError::Configuration(format!("Invalid log filter: {}", e)))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init(),
    };

    result.map_err(|e| {
        crate::ItemCacheError::Configuration(format!("Failed to install subscriber: {}", e))
    })?;

    tracing::info!(?format, "Logging initialized");
    Ok(())
}

/// No-op when the telemetry feature is disabled.
#[cfg(not(feature = "telemetry"))]
pub fn init_logging(_level: &str, _format: LogFormat) -> ItemCacheResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        assert_eq!(filter_directives(""), DEFAULT_FILTER);
        assert_eq!(filter_directives("warn"), "warn,itemcache=warn,tower_http=debug");
    }

    #[test]
    fn test_log_format_deserializes_lowercase() {
        let format: LogFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, LogFormat::Json);
    }
}
