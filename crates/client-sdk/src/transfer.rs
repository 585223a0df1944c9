//! Chunked upsert: encrypt a body once, then ship the ciphertext in parts.
//!
//! Part 0 carries the record metadata and the first slice; every later part
//! reuses the id the gateway returned for part 0. The first failed part aborts
//! the transfer.

use crate::api::{ApiError, VaultApi};
use crate::codec::{Codec, CryptoError};
use keeper_protocol::{split_parts, Record};
use thiserror::Error;
use tracing::{debug, info};

pub const CHUNK_SIZE: usize = 50_000_000;
pub const MAX_PAYLOAD: u64 = 20 * 1024 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferLimits {
    pub chunk_size: usize,
    pub max_payload: u64,
}

impl Default for TransferLimits {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            max_payload: MAX_PAYLOAD,
        }
    }
}

impl TransferLimits {
    pub fn check_size(&self, size: u64) -> Result<(), TransferError> {
        if size > self.max_payload {
            return Err(TransferError::TooLarge {
                size,
                limit: self.max_payload,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("part {part} rejected: {source}")]
    Upload {
        part: u32,
        #[source]
        source: ApiError,
    },

    #[error("fetch failed: {0}")]
    Fetch(#[source] ApiError),
}

impl TransferError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            TransferError::TooLarge { size, limit } => {
                format!("Слишком большой объём данных: {size} байт, допустимо не более {limit}")
            }
            TransferError::Upload { source, .. } | TransferError::Fetch(source) => source.user_message(),
            TransferError::Crypto(e) => e.user_message().to_string(),
        }
    }
}

pub struct Transfer<'a> {
    api: &'a dyn VaultApi,
    codec: &'a Codec,
    limits: TransferLimits,
}

impl<'a> Transfer<'a> {
    pub fn new(api: &'a dyn VaultApi, codec: &'a Codec, limits: TransferLimits) -> Self {
        Self { api, codec, limits }
    }

    /// Encrypts `plaintext` for `user_id` and stores it under `template`'s
    /// metadata. Returns the record as the gateway stored it after the final part.
    pub async fn upsert(
        &self,
        token: &str,
        user_id: &str,
        template: &Record,
        plaintext: &[u8],
    ) -> Result<Record, TransferError> {
        self.limits.check_size(plaintext.len() as u64)?;
        let ciphertext = self.codec.encrypt(plaintext, user_id)?;
        let parts = split_parts(&ciphertext, self.limits.chunk_size);
        let total = parts.len();

        let mut stored = template.clone();
        for part in parts {
            let request = Record {
                id: stored.id.clone(),
                user_id: user_id.to_string(),
                body: part.bytes.to_vec(),
                part: part.index,
                date: None,
                ..template.clone()
            };
            debug!(part = part.index, total, bytes = part.bytes.len(), "sending part");

            let reply = self
                .api
                .upsert(token, &request)
                .await
                .map_err(|source| TransferError::Upload {
                    part: part.index,
                    source,
                })?;
            if reply.id.is_empty() {
                return Err(TransferError::Upload {
                    part: part.index,
                    source: ApiError::Decode("stored record has no id".into()),
                });
            }
            stored = reply;
        }

        info!(id = %stored.id, parts = total, bytes = ciphertext.len(), "record stored");
        Ok(stored)
    }

    /// Fetches a record and returns it with `body` decrypted.
    pub async fn fetch(&self, token: &str, user_id: &str, id: &str) -> Result<Record, TransferError> {
        let mut record = self.api.get(token, id).await.map_err(TransferError::Fetch)?;
        record.body = self.codec.decrypt(&record.body, user_id)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AuthSession;
    use crate::codec::KeyStore;
    use async_trait::async_trait;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use keeper_protocol::{Credentials, RecordSummary, RecordType};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Reassembles parts by id, mimicking the gateway's replace/append rule.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, u32, usize)>>,
        bodies: Mutex<HashMap<String, Vec<u8>>>,
        fail_on_part: Option<u32>,
    }

    #[async_trait]
    impl VaultApi for Recorder {
        async fn register(&self, _: &Credentials) -> Result<AuthSession, ApiError> {
            unimplemented!()
        }

        async fn login(&self, _: &Credentials) -> Result<AuthSession, ApiError> {
            unimplemented!()
        }

        async fn list(&self, _: &str) -> Result<Vec<RecordSummary>, ApiError> {
            Ok(Vec::new())
        }

        async fn get(&self, _: &str, id: &str) -> Result<Record, ApiError> {
            let bodies = self.bodies.lock().unwrap();
            let body = bodies.get(id).cloned().ok_or(ApiError::Rejected {
                status: 500,
                message: "not found".into(),
            })?;
            let mut record = Record::new(RecordType::Text);
            record.id = id.to_string();
            record.body = body;
            Ok(record)
        }

        async fn upsert(&self, _: &str, record: &Record) -> Result<Record, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push((record.id.clone(), record.part, record.body.len()));
            if self.fail_on_part == Some(record.part) {
                return Err(ApiError::Rejected {
                    status: 500,
                    message: "disk full".into(),
                });
            }
            let id = if record.id.is_empty() {
                "rec-1".to_string()
            } else {
                record.id.clone()
            };
            let mut bodies = self.bodies.lock().unwrap();
            let slot = bodies.entry(id.clone()).or_default();
            if record.part == 0 {
                slot.clear();
            }
            slot.extend_from_slice(&record.body);

            let mut stored = record.clone();
            stored.id = id;
            stored.body.clear();
            Ok(stored)
        }
    }

    fn codec(dir: &tempfile::TempDir) -> Codec {
        let keys = KeyStore::new(dir.path());
        keys.store("u1", &STANDARD.encode([7u8; 16])).unwrap();
        Codec::new(keys)
    }

    #[tokio::test]
    async fn multi_part_upload_reuses_first_id_and_reassembles() {
        let dir = tempfile::tempdir().unwrap();
        let codec = codec(&dir);
        let api = Recorder::default();
        let limits = TransferLimits {
            chunk_size: 100,
            max_payload: 10_000,
        };
        let transfer = Transfer::new(&api, &codec, limits);

        let plaintext: Vec<u8> = (0..250u32).map(|i| (i % 251) as u8).collect();
        let mut template = Record::new(RecordType::File);
        template.name = b"photo.jpg".to_vec();

        let stored = transfer.upsert("t", "u1", &template, &plaintext).await.unwrap();
        assert_eq!(stored.id, "rec-1");

        // 250 bytes + 28 bytes of nonce and tag = 278 -> 3 parts of <= 100.
        let calls = api.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                (String::new(), 0, 100),
                ("rec-1".to_string(), 1, 100),
                ("rec-1".to_string(), 2, 78),
            ]
        );

        let fetched = transfer.fetch("t", "u1", "rec-1").await.unwrap();
        assert_eq!(fetched.body, plaintext);
    }

    #[tokio::test]
    async fn default_chunk_size_splits_large_payload_in_three() {
        let dir = tempfile::tempdir().unwrap();
        let codec = codec(&dir);
        let api = Recorder::default();
        let transfer = Transfer::new(&api, &codec, TransferLimits::default());

        let plaintext = vec![0x5au8; 120_000_000];
        transfer
            .upsert("t", "u1", &Record::new(RecordType::File), &plaintext)
            .await
            .unwrap();

        let calls = api.calls.lock().unwrap().clone();
        let parts: Vec<(u32, usize)> = calls.iter().map(|(_, part, len)| (*part, *len)).collect();
        assert_eq!(
            parts,
            vec![(0, CHUNK_SIZE), (1, CHUNK_SIZE), (2, 120_000_000 + 28 - 2 * CHUNK_SIZE)]
        );
    }

    #[tokio::test]
    async fn oversized_payload_is_refused_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let codec = codec(&dir);
        let api = Recorder::default();
        let limits = TransferLimits {
            chunk_size: 100,
            max_payload: 64,
        };
        let transfer = Transfer::new(&api, &codec, limits);

        let err = transfer
            .upsert("t", "u1", &Record::new(RecordType::Text), &[0u8; 65])
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::TooLarge { size: 65, limit: 64 }));
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_part_stops_the_transfer() {
        let dir = tempfile::tempdir().unwrap();
        let codec = codec(&dir);
        let api = Recorder {
            fail_on_part: Some(1),
            ..Default::default()
        };
        let limits = TransferLimits {
            chunk_size: 50,
            max_payload: 10_000,
        };
        let transfer = Transfer::new(&api, &codec, limits);

        let err = transfer
            .upsert("t", "u1", &Record::new(RecordType::Text), &[1u8; 200])
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Upload { part: 1, .. }));
        assert_eq!(err.user_message(), "disk full");
        assert_eq!(api.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_key_surfaces_as_crypto_error() {
        let dir = tempfile::tempdir().unwrap();
        let codec = codec(&dir);
        let api = Recorder::default();
        let transfer = Transfer::new(&api, &codec, TransferLimits::default());

        let err = transfer
            .upsert("t", "nobody", &Record::new(RecordType::Text), b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Crypto(CryptoError::KeyFile { .. })));
    }
}
