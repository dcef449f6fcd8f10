//! # Item Cache Server
//!
//! Serves the item API with a read-through cache in front of Postgres.
//! Writes go to the store first, then invalidate the cached line.

use itemcache_config::ConfigLoader;
use itemcache_core::{telemetry::init_logging, ItemCacheError, ItemCacheResult};
use itemcache_rest::create_router;
use itemcache_server::{
    di::AppContainer,
    startup::{install_metrics, print_startup_info, shutdown_signal, spawn_reload_on_hangup},
};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Application error: {}", e);
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> ItemCacheResult<()> {
    let loader = ConfigLoader::from_default_location()?;
    let config = loader.get().await;

    init_logging(&config.observability.log_level, config.observability.log_format)?;

    info!("Starting Item Cache Server...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.environment);

    let container = AppContainer::build(&config, loader.subscribe_cache()).await?;
    spawn_reload_on_hangup(loader.clone());

    let mut router = create_router(container.app_state(), &config.server);
    if config.observability.metrics_enabled {
        router = router.merge(install_metrics(&config.observability.metrics_path)?);
    }

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ItemCacheError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
    print_startup_info(&config);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ItemCacheError::Internal(format!("REST server error: {}", e)));

    container.shutdown().await;
    served?;

    info!("Server shutdown complete");
    Ok(())
}
