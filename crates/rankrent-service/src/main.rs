//! Rankrent Service - HTTP API for the niche discovery engine.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rankrent_service::{create_router, AppState, ServiceConfig};
use rankrent_store::{PgStore, Store};

/// Connections held by the PostgreSQL pool.
const PG_MAX_CONNECTIONS: u32 = 10;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rankrent=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Rankrent Service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        postgres = %config.database_url.is_some(),
        stripe_configured = %config.stripe_api_key.is_some(),
        result_cap = config.engine.result_cap,
        metrics_delay_ms = u64::try_from(config.engine.metrics_delay.as_millis()).unwrap_or(u64::MAX),
        "Service configuration loaded"
    );

    let store = open_store(&config).await?;
    let state = AppState::new(store, config.clone())?;

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Pick the storage backend: PostgreSQL when `DATABASE_URL` is set, otherwise
/// the embedded store.
async fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    if let Some(url) = &config.database_url {
        tracing::info!("Connecting to PostgreSQL");
        let store = PgStore::connect(url, PG_MAX_CONNECTIONS).await?;
        store.migrate().await?;
        return Ok(Arc::new(store));
    }

    open_embedded_store(config)
}

#[cfg(feature = "rocksdb-backend")]
fn open_embedded_store(
    config: &ServiceConfig,
) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    Ok(Arc::new(rankrent_store::RocksStore::open(&config.data_dir)?))
}

#[cfg(not(feature = "rocksdb-backend"))]
fn open_embedded_store(
    _config: &ServiceConfig,
) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    tracing::warn!("No DATABASE_URL and RocksDB disabled - using in-memory store");
    Ok(Arc::new(rankrent_store::MemoryStore::new()))
}
