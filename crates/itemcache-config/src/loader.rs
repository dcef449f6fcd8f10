//! Configuration loader with layered sources.

use crate::{AppConfig, CacheConfig, ConfigValidator};
use config::{Config, ConfigError, Environment, File};
use itemcache_core::ItemCacheError;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

/// Environment variable selecting the environment overlay file.
pub const ENVIRONMENT_VAR: &str = "ITEMCACHE_ENVIRONMENT";

/// Configuration loader with runtime refresh support.
///
/// The cache section is additionally published on a `watch` channel so the
/// coherence engine picks up new TTLs and wait windows without a restart.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    cache_tx: Arc<watch::Sender<CacheConfig>>,
    config_dir: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `{dir}/default.toml` - Default values
    /// 2. `{dir}/{environment}.toml` - Environment-specific overrides
    /// 3. `{dir}/local.toml` - Local, uncommitted overrides
    /// 4. Environment variables `ITEMCACHE__SECTION__KEY`
    pub fn new(config_dir: impl Into<String>) -> Result<Self, ItemCacheError> {
        let config_dir = config_dir.into();
        let config = Self::load_config(&config_dir)?;
        let (cache_tx, _) = watch::channel(config.cache.clone());

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            cache_tx: Arc::new(cache_tx),
            config_dir,
        })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> Result<Self, ItemCacheError> {
        Self::new("./config")
    }

    /// Returns the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Subscribes to cache setting changes. The receiver starts at the
    /// current value.
    #[must_use]
    pub fn subscribe_cache(&self) -> watch::Receiver<CacheConfig> {
        self.cache_tx.subscribe()
    }

    /// Reloads the configuration from disk.
    ///
    /// On failure the previous configuration stays in force.
    pub async fn reload(&self) -> Result<(), ItemCacheError> {
        let new_config = Self::load_config(&self.config_dir)?;
        let cache = new_config.cache.clone();

        let mut config = self.config.write().await;
        if config.database.url != new_config.database.url || config.redis.url != new_config.redis.url {
            warn!("Connection settings changed; they take effect on the next restart");
        }
        *config = new_config;
        drop(config);

        self.cache_tx.send_if_modified(|current| {
            if *current == cache {
                false
            } else {
                *current = cache;
                true
            }
        });
        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Loads configuration from the specified directory.
    fn load_config(config_dir: &str) -> Result<AppConfig, ItemCacheError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| "development".to_string());

        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        for name in ["default", environment.as_str(), "local"] {
            let path = format!("{}/{}.toml", config_dir, name);
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("ITEMCACHE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_error_to_item_cache_error)?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(config_error_to_item_cache_error)?;

        Self::validate_config(&app_config)?;

        Ok(app_config)
    }

    /// Validates the configuration.
    fn validate_config(config: &AppConfig) -> Result<(), ItemCacheError> {
        ConfigValidator::validate(config).map_err(|errors| {
            let joined = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            ItemCacheError::Configuration(joined)
        })?;

        if config.app.environment == "production" && !config.redis.enabled {
            warn!("Redis is disabled in production; cache coherence is local to each instance");
        }

        Ok(())
    }

    /// Gets a specific configuration value by key path.
    pub async fn get_value<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let config = self.config.read().await;
        let json = serde_json::to_value(&*config).ok()?;

        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }

        serde_json::from_value(current.clone()).ok()
    }
}

fn config_error_to_item_cache_error(err: ConfigError) -> ItemCacheError {
    ItemCacheError::Configuration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WritePolicy;
    use std::fs;
    use tempfile::TempDir;

    fn write_default(dir: &TempDir, body: &str) {
        fs::write(dir.path().join("default.toml"), body).unwrap();
    }

    fn dir_str(dir: &TempDir) -> String {
        dir.path().to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_loads_file_over_defaults() {
        let dir = TempDir::new().unwrap();
        write_default(
            &dir,
            r#"
            [server]
            port = 9000

            [cache]
            negative_ttl_secs = 10
            write_policy = "optimistic"
            "#,
        );

        let loader = ConfigLoader::new(dir_str(&dir)).unwrap();
        let config = loader.get().await;
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.cache.negative_ttl_secs, 10);
        assert_eq!(config.cache.positive_ttl_secs, 600);
        assert_eq!(config.cache.write_policy, WritePolicy::Optimistic);
    }

    #[tokio::test]
    async fn test_local_overrides_default() {
        let dir = TempDir::new().unwrap();
        write_default(&dir, "[cache]\nnegative_ttl_secs = 10\n");
        fs::write(dir.path().join("local.toml"), "[cache]\nnegative_ttl_secs = 20\n").unwrap();

        let loader = ConfigLoader::new(dir_str(&dir)).unwrap();
        assert_eq!(loader.get().await.cache.negative_ttl_secs, 20);
    }

    #[tokio::test]
    async fn test_invalid_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_default(&dir, "[cache]\nnegative_ttl_secs = 900\n");

        let err = ConfigLoader::new(dir_str(&dir)).err().unwrap();
        assert!(matches!(err, ItemCacheError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_reload_publishes_cache_settings() {
        let dir = TempDir::new().unwrap();
        write_default(&dir, "[cache]\nfill_wait_timeout_ms = 500\n");

        let loader = ConfigLoader::new(dir_str(&dir)).unwrap();
        let mut rx = loader.subscribe_cache();
        assert_eq!(rx.borrow_and_update().fill_wait_timeout_ms, 500);

        write_default(&dir, "[cache]\nfill_wait_timeout_ms = 800\n");
        loader.reload().await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().fill_wait_timeout_ms, 800);
        assert_eq!(loader.get().await.cache.fill_wait_timeout_ms, 800);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_settings() {
        let dir = TempDir::new().unwrap();
        write_default(&dir, "[cache]\nnegative_ttl_secs = 15\n");
        let loader = ConfigLoader::new(dir_str(&dir)).unwrap();
        let rx = loader.subscribe_cache();

        write_default(&dir, "[cache]\nnegative_ttl_secs = 0\n");
        assert!(loader.reload().await.is_err());

        assert!(!rx.has_changed().unwrap());
        assert_eq!(loader.get().await.cache.negative_ttl_secs, 15);
    }

    #[tokio::test]
    async fn test_unchanged_reload_does_not_notify() {
        let dir = TempDir::new().unwrap();
        write_default(&dir, "[server]\nport = 8081\n");
        let loader = ConfigLoader::new(dir_str(&dir)).unwrap();
        let rx = loader.subscribe_cache();

        write_default(&dir, "[server]\nport = 8082\n");
        loader.reload().await.unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_get_value_by_path() {
        let dir = TempDir::new().unwrap();
        write_default(&dir, "");
        let loader = ConfigLoader::new(dir_str(&dir)).unwrap();
        let ttl: Option<u64> = loader.get_value("cache.positive_ttl_secs").await;
        assert_eq!(ttl, Some(600));
    }
}
