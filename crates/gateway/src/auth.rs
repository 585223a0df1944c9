//! Session tokens and caller identity.

use crate::error::AppError;
use crate::store::VaultStore;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const TOKEN_TTL_HOURS: i64 = 3;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub iat: usize,
    pub exp: usize,
}

/// Issues and checks HS256 session tokens signed with the gateway master key.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn issue(&self, user_id: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user_id.to_owned(),
            iat: now.timestamp() as usize,
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
    }

    /// Returns the user id carried by a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Option<String> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .ok()
            .map(|data| data.claims.user_id)
            .filter(|id| !id.is_empty())
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolves the caller behind `headers`. An invalid token is rejected
/// before the store is consulted; a valid token for a missing or deleted
/// user is rejected too.
pub async fn authenticate(
    headers: &HeaderMap,
    tokens: &TokenIssuer,
    store: &dyn VaultStore,
) -> Result<String, AppError> {
    let user_id = bearer_token(headers)
        .and_then(|t| tokens.verify(t))
        .ok_or_else(AppError::unauthorized)?;

    match store.user_by_id(&user_id).await? {
        Some(user) if !user.deleted => Ok(user.id),
        _ => {
            tracing::debug!(%user_id, "token for unknown user");
            Err(AppError::unauthorized())
        }
    }
}
