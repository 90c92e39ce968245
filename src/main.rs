//! Generation Cache driver
//!
//! Runs a manager the way a rendering service would: pages are rendered into
//! the cache per locale and the generation is cycled whenever the upstream
//! status changes.
//!
//! # Startup Sequence
//! 1. Initialize tracing subscriber for logging
//! 2. Load and validate configuration from environment variables
//! 3. Create the cache manager and register the page and navigation classes
//! 4. Render and cycle on a fixed period until SIGINT/SIGTERM

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use generation_cache::generation::{cache_key, status_checksum};
use generation_cache::{Cache, CacheManager, CacheOptions, Config, MemoryCacheManager};

/// How often the simulated upstream status changes.
const CYCLE_PERIOD: Duration = Duration::from_secs(10);

const LOCALES: [&str; 2] = ["en", "de"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "generation_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    config.validate()?;
    info!(
        "Configuration loaded: host={}, default_ttl={}s, reap_interval={:?}",
        config.host,
        config.default_ttl,
        config.reap_interval()
    );

    let manager = MemoryCacheManager::from_config(&config);

    let mut observed_generation = 0;
    let mut attributes = HashMap::from([("release".to_string(), "0".to_string())]);
    manager
        .cycle(&status_checksum(observed_generation, &attributes), true)
        .await?;

    let pages = manager.get_cache("pages", CacheOptions::default()).await;
    let navigation = manager
        .get_cache(
            "navigation",
            CacheOptions::default()
                .with_ttl(Duration::from_secs(60))
                .uncycled(),
        )
        .await;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(CYCLE_PERIOD);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                render("home", &pages).await?;
                render("main-menu", &navigation).await?;

                observed_generation += 1;
                attributes.insert("release".to_string(), observed_generation.to_string());
                manager
                    .cycle(&status_checksum(observed_generation, &attributes), false)
                    .await?;

                info!("Status: {}", serde_json::to_string(&manager.status().await)?);
            }
            _ = &mut shutdown => break,
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Serves `name` for every locale, rendering on a miss or stale hit.
async fn render(name: &str, cache: &Arc<dyn Cache>) -> generation_cache::Result<()> {
    let checksum = cache.checksum().await;
    for locale in LOCALES {
        let key = cache_key(name, &checksum, locale);
        let lookup = cache.get(&key).await?;
        if lookup.is_found() && lookup.is_current() {
            debug!(class = cache.class(), "Serving {} from cache", key);
            continue;
        }

        let html = format!(
            "<main data-content-id=\"{name}\" data-host=\"{}\" lang=\"{locale}\"></main>",
            cache.host()
        );
        cache.set(&key, html).await?;
        debug!(class = cache.class(), "Rendered {}", key);
    }
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
