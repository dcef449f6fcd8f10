//! Configuration validation.
//!
//! Collects every problem in one pass so an operator sees the whole list
//! instead of fixing one key per restart.

use crate::AppConfig;
use std::fmt;
use url::Url;

/// A single configuration problem.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    InvalidPort { name: String, value: u16 },
    InvalidPoolSize { min: u32, max: u32 },
    PoolSizeTooLarge { value: u32, maximum: u32 },
    InvalidUrl { url_type: String, message: String },
    NonPositiveTimeout { name: String, value: u64 },
    NegativeTtlNotShorter { negative: u64, positive: u64 },
    PollIntervalExceedsWait { interval_ms: u64, wait_ms: u64 },
    NoInvalidationAttempts,
    InvalidLogLevel { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPort { name, value } => {
                write!(f, "Invalid port for {}: {} (must be 1-65535)", name, value)
            }
            Self::InvalidPoolSize { min, max } => {
                write!(
                    f,
                    "Invalid pool size: min ({}) cannot be greater than max ({})",
                    min, max
                )
            }
            Self::PoolSizeTooLarge { value, maximum } => {
                write!(f, "Pool size {} exceeds maximum allowed ({})", value, maximum)
            }
            Self::InvalidUrl { url_type, message } => {
                write!(f, "Invalid {} URL: {}", url_type, message)
            }
            Self::NonPositiveTimeout { name, value } => {
                write!(f, "Timeout '{}' must be positive, got {}", name, value)
            }
            Self::NegativeTtlNotShorter { negative, positive } => {
                write!(
                    f,
                    "cache.negative_ttl_secs ({}) must be shorter than cache.positive_ttl_secs ({})",
                    negative, positive
                )
            }
            Self::PollIntervalExceedsWait { interval_ms, wait_ms } => {
                write!(
                    f,
                    "cache.fill_poll_interval_ms ({}) cannot exceed cache.fill_wait_timeout_ms ({})",
                    interval_ms, wait_ms
                )
            }
            Self::NoInvalidationAttempts => {
                write!(f, "cache.invalidation_max_attempts must be at least 1")
            }
            Self::InvalidLogLevel { value } => {
                write!(
                    f,
                    "Invalid log level: '{}' (valid: trace, debug, info, warn, error)",
                    value
                )
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Maximum connection pool size.
    const MAX_POOL_SIZE: u32 = 1000;
    /// Valid log levels.
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];

    /// Validates the entire application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        Self::validate_server(&config.server, &mut errors);
        Self::validate_database(&config.database, &mut errors);
        Self::validate_redis(&config.redis, &mut errors);
        Self::validate_cache(&config.cache, &mut errors);
        Self::validate_observability(&config.observability, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_server(config: &crate::ServerConfig, errors: &mut Vec<ConfigValidationError>) {
        if config.port == 0 {
            errors.push(ConfigValidationError::InvalidPort {
                name: "server.port".to_string(),
                value: config.port,
            });
        }
        if config.request_timeout_secs == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "server.request_timeout_secs".to_string(),
                value: 0,
            });
        }
    }

    fn validate_database(config: &crate::DatabaseConfig, errors: &mut Vec<ConfigValidationError>) {
        if config.url.is_empty() {
            errors.push(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL cannot be empty".to_string(),
            });
        } else if !config.url.starts_with("postgres://") && !config.url.starts_with("postgresql://") {
            errors.push(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL must start with postgres:// or postgresql://".to_string(),
            });
        }

        if config.min_connections > config.max_connections {
            errors.push(ConfigValidationError::InvalidPoolSize {
                min: config.min_connections,
                max: config.max_connections,
            });
        }
        if config.max_connections > Self::MAX_POOL_SIZE {
            errors.push(ConfigValidationError::PoolSizeTooLarge {
                value: config.max_connections,
                maximum: Self::MAX_POOL_SIZE,
            });
        }

        if config.connect_timeout_secs == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "database.connect_timeout_secs".to_string(),
                value: 0,
            });
        }
    }

    fn validate_redis(config: &crate::RedisConfig, errors: &mut Vec<ConfigValidationError>) {
        if !config.enabled {
            return;
        }

        match Url::parse(&config.url) {
            Ok(url) if url.scheme() == "redis" || url.scheme() == "rediss" => {}
            Ok(_) => errors.push(ConfigValidationError::InvalidUrl {
                url_type: "redis".to_string(),
                message: "URL must start with redis:// or rediss://".to_string(),
            }),
            Err(e) => errors.push(ConfigValidationError::InvalidUrl {
                url_type: "redis".to_string(),
                message: e.to_string(),
            }),
        }

        if config.pool_size > Self::MAX_POOL_SIZE {
            errors.push(ConfigValidationError::PoolSizeTooLarge {
                value: config.pool_size,
                maximum: Self::MAX_POOL_SIZE,
            });
        }
    }

    /// Cache tuning rules. Also used on reload, where only this section changes.
    pub fn validate_cache(config: &crate::CacheConfig, errors: &mut Vec<ConfigValidationError>) {
        let positive = [
            ("cache.positive_ttl_secs", config.positive_ttl_secs),
            ("cache.negative_ttl_secs", config.negative_ttl_secs),
            ("cache.fill_lease_ttl_ms", config.fill_lease_ttl_ms),
            ("cache.fill_poll_interval_ms", config.fill_poll_interval_ms),
            ("cache.fill_wait_timeout_ms", config.fill_wait_timeout_ms),
            ("cache.operation_timeout_ms", config.operation_timeout_ms),
        ];
        for (name, value) in positive {
            if value == 0 {
                errors.push(ConfigValidationError::NonPositiveTimeout {
                    name: name.to_string(),
                    value,
                });
            }
        }

        if config.negative_ttl_secs >= config.positive_ttl_secs {
            errors.push(ConfigValidationError::NegativeTtlNotShorter {
                negative: config.negative_ttl_secs,
                positive: config.positive_ttl_secs,
            });
        }
        if config.fill_poll_interval_ms > config.fill_wait_timeout_ms {
            errors.push(ConfigValidationError::PollIntervalExceedsWait {
                interval_ms: config.fill_poll_interval_ms,
                wait_ms: config.fill_wait_timeout_ms,
            });
        }
        if config.invalidation_max_attempts == 0 {
            errors.push(ConfigValidationError::NoInvalidationAttempts);
        }
    }

    fn validate_observability(
        config: &crate::ObservabilityConfig,
        errors: &mut Vec<ConfigValidationError>,
    ) {
        let level = config.log_level.to_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(ConfigValidationError::InvalidLogLevel {
                value: config.log_level.clone(),
            });
        }
    }
}
