//! Keeper vault gateway: user accounts, bearer-token auth and the record
//! store behind the agent's HTTP API.

pub mod app;
pub mod auth;
pub mod blob;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod service;
pub mod store;

pub use app::{router, AppState};
pub use blob::BlobStore;
pub use config::GatewayConfig;
pub use error::AppError;
pub use service::RecordService;
pub use store::{MemoryStore, PgStore, VaultStore};
