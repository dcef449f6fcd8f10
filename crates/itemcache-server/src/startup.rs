//! Server startup utilities.

use axum::{routing::get, Router};
use itemcache_config::{AppConfig, ConfigLoader};
use itemcache_core::{ItemCacheError, ItemCacheResult};
use itemcache_service::register_metrics;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tracing::{error, info, warn};

/// Prints server startup information.
pub fn print_startup_info(config: &AppConfig) {
    let separator = "=".repeat(60);
    let addr = config.server.addr();
    info!("{}", separator);
    info!("REST API:  http://{}/api/v1/items", addr);
    info!("Health:    http://{}/health", addr);
    info!("API Docs:  http://{}/swagger-ui", addr);
    if config.observability.metrics_enabled {
        info!("Metrics:   http://{}{}", addr, config.observability.metrics_path);
    }
    info!(
        "Cache:     {}",
        if config.redis.enabled { config.redis.url.as_str() } else { "in-process" }
    );
    info!("{}", separator);
}

/// Installs the global Prometheus recorder, describes the coherence metrics
/// to it, and returns a router serving it.
///
/// Descriptions given before a recorder is installed are lost.
pub fn install_metrics(path: &str) -> ItemCacheResult<Router> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ItemCacheError::Configuration(format!("Failed to install metrics recorder: {}", e)))?;
    register_metrics();
    info!("Prometheus recorder installed");
    Ok(metrics_router(path, handle))
}

/// Router exposing the recorder's scrape output at `path`.
pub fn metrics_router(path: &str, handle: PrometheusHandle) -> Router {
    Router::new().route(
        path,
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    )
}

/// Reloads configuration whenever the process receives SIGHUP.
///
/// Only the cache tuning takes effect immediately; connection settings
/// wait for a restart.
#[cfg(unix)]
pub fn spawn_reload_on_hangup(loader: ConfigLoader) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Failed to install SIGHUP handler, runtime reload disabled: {}", e);
            return;
        }
    };

    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            info!("Received SIGHUP, reloading configuration");
            if let Err(e) = loader.reload().await {
                warn!("Configuration reload failed, keeping previous settings: {}", e);
            }
        }
    });
}

#[cfg(not(unix))]
pub fn spawn_reload_on_hangup(_loader: ConfigLoader) {}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
