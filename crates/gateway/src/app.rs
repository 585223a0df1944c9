use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Json, Router,
};
use keeper_protocol::routes;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, decompression::RequestDecompressionLayer, trace::TraceLayer,
};

use crate::auth::TokenIssuer;
use crate::blob::BlobStore;
use crate::handlers;
use crate::service::RecordService;
use crate::store::VaultStore;

pub struct AppState {
    pub store: Arc<dyn VaultStore>,
    pub records: RecordService,
    pub tokens: TokenIssuer,
}

impl AppState {
    pub fn new(store: Arc<dyn VaultStore>, blobs: BlobStore, master_key: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            records: RecordService::new(Arc::clone(&store), blobs),
            store,
            tokens: TokenIssuer::new(master_key),
        })
    }
}

pub fn router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route(routes::READY, get(health_check))
        .route(routes::REGISTER, post(handlers::auth::register))
        .route(routes::LOGIN, post(handlers::auth::login))
        .route(routes::LIST, post(handlers::records::list))
        .route(routes::GET, post(handlers::records::get))
        .route(routes::UPDATE, put(handlers::records::update))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(RequestDecompressionLayer::new())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "keeper-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
