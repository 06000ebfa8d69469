pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use logic::{DirectoryError, DirectoryResult, InstanceDirectory};

// Export all model types
pub use model::*;

// Export store types
pub use store::{InstanceStore, MemoryStore, PostgresStore, Store, StoreError};

use std::sync::Arc;

use crate::api::handlers::ApiState;
use crate::config::{AppConfig, StorageBackend};

/// Build the application router over `store`
pub fn build_app<S: Store + 'static>(store: Arc<S>, config: &AppConfig) -> axum::Router {
    api::routes::create_router().with_state(Arc::new(ApiState::new(store, config)))
}

/// Serve `app` on an already bound listener until the server stops
pub async fn serve_app(listener: tokio::net::TcpListener, app: axum::Router) -> anyhow::Result<()> {
    axum::serve(listener, app).await?;
    Ok(())
}

/// Load configuration, open the configured store and serve requests
pub async fn run_server() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    log::info!(
        "Configuration loaded: server={} backend={:?}",
        config.server_address(),
        config.storage.backend
    );

    let app = match config.storage.backend {
        StorageBackend::Postgres => {
            log::info!("Connecting to PostgreSQL...");
            let database_url = config.database_url()?;
            let store = PostgresStore::new(&database_url, config.max_connections()).await?;

            log::info!("Running database migrations...");
            store.migrate().await?;

            build_app(Arc::new(store), &config)
        }
        StorageBackend::Memory => {
            log::warn!("Using in-memory storage; instances will not survive a restart");
            build_app(Arc::new(MemoryStore::new()), &config)
        }
    };

    let bind_address = config.server_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    log::info!("Instance directory running on http://{}", bind_address);

    serve_app(listener, app).await
}
