//! Password hashing and per-user key material.

use crate::error::AppError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use tokio::task;
use zeroize::Zeroize;

/// Size of the symmetric key handed to a newly registered user.
pub const USER_KEY_LEN: usize = 16;

/// Runs on a blocking worker.
pub async fn hash_password(password: String) -> Result<String, AppError> {
    task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
    })
    .await
    .map_err(|e| AppError::Internal(format!("password hashing worker failed: {e}")))?
    .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    task::spawn_blocking(move || match PasswordHash::new(&hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    })
    .await
    .map_err(|e| AppError::Internal(format!("password verification worker failed: {e}")))
}

/// Fresh random key for a user, base64 encoded.
pub fn generate_user_key() -> String {
    let mut key = [0u8; USER_KEY_LEN];
    rand::thread_rng().fill_bytes(&mut key);
    let encoded = STANDARD.encode(key);
    key.zeroize();
    encoded
}
