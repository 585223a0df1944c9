use crate::blob::BlobStore;
use crate::error::AppError;
use crate::store::{BodyWrite, VaultStore};
use chrono::Utc;
use keeper_protocol::{Record, RecordSummary, RecordType};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Record operations on behalf of an authenticated user.
#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn VaultStore>,
    blobs: BlobStore,
}

impl RecordService {
    pub fn new(store: Arc<dyn VaultStore>, blobs: BlobStore) -> Self {
        Self { store, blobs }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<RecordSummary>, AppError> {
        Ok(self.store.list_records(user_id).await?)
    }

    /// Fetches a record by id with its ciphertext body. File records get the
    /// blob contents as body.
    ///
    /// Neither ownership nor the deleted flag is checked here.
    pub async fn get(&self, user_id: &str, id: &str) -> Result<Record, AppError> {
        let mut record = self
            .store
            .get_record(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("record {id} not found")))?;

        if record.record_type == RecordType::File {
            record.body = self.blobs.read(id).await?;
        }
        debug!(%user_id, %id, bytes = record.body.len(), "record fetched");
        Ok(record)
    }

    /// Stores one part of a record and returns it without body.
    pub async fn upsert(&self, user_id: &str, mut record: Record) -> Result<Record, AppError> {
        let part = record.part;
        if part > 0 && record.id.is_empty() {
            return Err(AppError::bad_request());
        }
        if record.id.is_empty() {
            record.id = Uuid::new_v4().to_string();
        } else if let Some(stored) = self.store.record_type(&record.id).await? {
            // Type is fixed at creation; file bodies live in blobs, others inline.
            if stored != record.record_type {
                warn!(id = %record.id, %stored, requested = %record.record_type, "record type change refused");
                return Err(AppError::bad_request());
            }
        }
        record.user_id = user_id.to_string();
        record.date = Some(Utc::now());

        let write = if part == 0 {
            BodyWrite::Replace
        } else {
            BodyWrite::Append
        };

        let bytes = record.body.len();
        if record.record_type == RecordType::File {
            self.blobs.write(&record.id, &record.body, part > 0).await?;
            record.body.clear();
        }
        self.store.save_record(&record, write).await?;
        info!(id = %record.id, %user_id, part, bytes, kind = %record.record_type, "record part stored");

        record.body.clear();
        Ok(record)
    }
}
