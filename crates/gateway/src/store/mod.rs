//! Persistence for users and records.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use keeper_protocol::{Record, RecordSummary, RecordType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user {0} already exists")]
    AlreadyExists(String),

    #[error("corrupt row {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub password_hash: String,
    pub deleted: bool,
}

/// How an upsert treats the stored body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyWrite {
    Replace,
    Append,
}

#[async_trait]
pub trait VaultStore: Send + Sync {
    /// Fails with `AlreadyExists` when the user name is taken.
    async fn create_user(&self, user: &User) -> Result<(), StoreError>;

    async fn user_by_name(&self, name: &str) -> Result<Option<User>, StoreError>;

    async fn user_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Non-deleted records of `user_id` in storage order.
    async fn list_records(&self, user_id: &str) -> Result<Vec<RecordSummary>, StoreError>;

    async fn get_record(&self, id: &str) -> Result<Option<Record>, StoreError>;

    /// Stored type of a record, without loading its body.
    async fn record_type(&self, id: &str) -> Result<Option<RecordType>, StoreError>;

    /// Inserts or overwrites every column of `record`. With `BodyWrite::Append`
    /// the body is concatenated to the stored one instead of replacing it.
    async fn save_record(&self, record: &Record, body: BodyWrite) -> Result<(), StoreError>;

    async fn close(&self);
}
