use super::{BodyWrite, StoreError, User, VaultStore};
use async_trait::async_trait;
use keeper_protocol::{Record, RecordSummary, RecordType};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local store. Records keep insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    records: RwLock<Vec<Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VaultStore for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.name == user.name) {
            return Err(StoreError::AlreadyExists(user.name.clone()));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn user_by_name(&self, name: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.name == name).cloned())
    }

    async fn user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn list_records(&self, user_id: &str) -> Result<Vec<RecordSummary>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.user_id == user_id && !r.deleted)
            .map(Record::summary)
            .collect())
    }

    async fn get_record(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn record_type(&self, id: &str) -> Result<Option<RecordType>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).map(|r| r.record_type))
    }

    async fn save_record(&self, record: &Record, body: BodyWrite) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let mut next = record.clone();
        next.part = 0;

        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => {
                if body == BodyWrite::Append {
                    let mut joined = std::mem::take(&mut existing.body);
                    joined.extend_from_slice(&record.body);
                    next.body = joined;
                }
                *existing = next;
            }
            None => records.push(next),
        }
        Ok(())
    }

    async fn close(&self) {}
}
