//! Per-user AEAD codec for record bodies.
//!
//! Each user owns one 16-byte AES key, stored base64-encoded in a file named
//! after the user id. Ciphertext layout is `nonce (12) ‖ ciphertext ‖ tag (16)`
//! with a fresh random nonce per encryption.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes128Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zeroize::Zeroizing;

pub const KEY_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key file name is empty")]
    MissingUserId,

    #[error("user id {0:?} cannot name a key file")]
    InvalidUserId(String),

    #[error("failed to access key file {path}: {source}")]
    KeyFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("key file {path} is not valid base64: {source}")]
    MalformedKey {
        path: PathBuf,
        #[source]
        source: base64::DecodeError,
    },

    #[error("key must be {expected} bytes, got {actual}")]
    KeySize { expected: usize, actual: usize },

    #[error("ciphertext is shorter than nonce and tag")]
    Truncated,

    #[error("encryption failed")]
    Seal,

    #[error("decryption failed: ciphertext is corrupt or was sealed with another key")]
    Open,
}

impl CryptoError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            CryptoError::MissingUserId
            | CryptoError::InvalidUserId(_)
            | CryptoError::KeyFile { .. } => "Не найден ключ шифрования пользователя",
            CryptoError::MalformedKey { .. } | CryptoError::KeySize { .. } => {
                "Файл ключа шифрования повреждён"
            }
            CryptoError::Truncated | CryptoError::Open => {
                "Запись повреждена или зашифрована другим ключом"
            }
            CryptoError::Seal => "Не удалось зашифровать запись",
        }
    }
}

/// Directory of per-user key files.
#[derive(Debug, Clone)]
pub struct KeyStore {
    dir: PathBuf,
}

impl KeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn key_path(&self, user_id: &str) -> Result<PathBuf, CryptoError> {
        if user_id.is_empty() {
            return Err(CryptoError::MissingUserId);
        }
        if user_id.contains(['/', '\\']) || user_id == "." || user_id == ".." {
            return Err(CryptoError::InvalidUserId(user_id.to_string()));
        }
        Ok(self.dir.join(user_id))
    }

    pub fn load(&self, user_id: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let path = self.key_path(user_id)?;
        let encoded = Zeroizing::new(std::fs::read_to_string(&path).map_err(|source| {
            CryptoError::KeyFile {
                path: path.clone(),
                source,
            }
        })?);
        let key = STANDARD
            .decode(encoded.trim())
            .map_err(|source| CryptoError::MalformedKey { path, source })?;
        let key = Zeroizing::new(key);
        if key.len() != KEY_LEN {
            return Err(CryptoError::KeySize {
                expected: KEY_LEN,
                actual: key.len(),
            });
        }
        Ok(key)
    }

    /// Persists key material received at registration. The key is validated
    /// before anything is written.
    pub fn store(&self, user_id: &str, key_b64: &str) -> Result<PathBuf, CryptoError> {
        let path = self.key_path(user_id)?;
        let decoded = Zeroizing::new(STANDARD.decode(key_b64.trim()).map_err(|source| {
            CryptoError::MalformedKey {
                path: path.clone(),
                source,
            }
        })?);
        if decoded.len() != KEY_LEN {
            return Err(CryptoError::KeySize {
                expected: KEY_LEN,
                actual: decoded.len(),
            });
        }

        let io_err = |source| CryptoError::KeyFile {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        std::fs::write(&path, key_b64.trim()).map_err(io_err)?;
        Ok(path)
    }
}

#[derive(Debug, Clone)]
pub struct Codec {
    keys: KeyStore,
}

impl Codec {
    pub fn new(keys: KeyStore) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }

    pub fn encrypt(&self, plaintext: &[u8], user_id: &str) -> Result<Vec<u8>, CryptoError> {
        let cipher = self.cipher(user_id)?;
        let nonce = Aes128Gcm::generate_nonce(&mut OsRng);
        let sealed = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CryptoError::Seal)?;

        let mut combined = Vec::with_capacity(NONCE_LEN + sealed.len());
        combined.extend_from_slice(&nonce);
        combined.extend(sealed);
        Ok(combined)
    }

    pub fn decrypt(&self, ciphertext: &[u8], user_id: &str) -> Result<Vec<u8>, CryptoError> {
        let cipher = self.cipher(user_id)?;
        if ciphertext.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::Truncated);
        }
        let (nonce_bytes, sealed) = ciphertext.split_at(NONCE_LEN);
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| CryptoError::Open)
    }

    fn cipher(&self, user_id: &str) -> Result<Aes128Gcm, CryptoError> {
        let key = self.keys.load(user_id)?;
        Aes128Gcm::new_from_slice(&key).map_err(|_| CryptoError::KeySize {
            expected: KEY_LEN,
            actual: key.len(),
        })
    }
}
