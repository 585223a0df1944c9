use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use keeper_gateway::{router, AppState, BlobStore, GatewayConfig, MemoryStore, PgStore, VaultStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = GatewayConfig::parse();
    info!(version = env!("CARGO_PKG_VERSION"), "Starting keeper gateway");

    let store: Arc<dyn VaultStore> = match &config.database_url {
        Some(url) => {
            info!("Connecting to PostgreSQL...");
            Arc::new(PgStore::connect(url, config.max_connections).await?)
        }
        None => {
            warn!("DATABASE_URI not set, records are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let blobs = BlobStore::open(&config.files_dir).await?;
    let state = AppState::new(Arc::clone(&store), blobs, config.master_key.as_bytes());
    let app = router(state, config.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("Keeper gateway listening on {}", config.addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, closing storage");
    store.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
