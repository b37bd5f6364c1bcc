//! Card key service entry point.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cardkey_service::{create_router, AppState, ServiceConfig};
use cardkey_store::Store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cardkey=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting card key service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        default_prefix = %config.default_prefix,
        max_batch_size = config.max_batch_size,
        "Service configuration loaded"
    );

    let store = open_store(&config)?;
    let state = AppState::new(store, config.clone());
    let app = create_router(state);

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "rocksdb-backend")]
fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    Ok(Arc::new(cardkey_store::RocksStore::open(&config.data_dir)?))
}

#[cfg(not(feature = "rocksdb-backend"))]
fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    tracing::warn!(
        data_dir = %config.data_dir,
        "Built without RocksDB; card keys are kept in memory and lost on restart"
    );
    Ok(Arc::new(cardkey_store::MemoryStore::new()))
}
