use async_trait::async_trait;
use keeper_protocol::{Credentials, Record, RecordSummary};
use thiserror::Error;

/// Identity handed back by a successful register or login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: String,
    pub token: String,
    pub message: String,
    /// Base64 key material. Only set on registration.
    pub key: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("gateway unreachable: {0}")]
    Transport(String),

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected gateway response: {0}")]
    Decode(String),

    #[error("failed to encode request: {0}")]
    Encode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text suitable for showing to the user. Server messages pass through;
    /// local failures get a fixed sentence and keep their detail for the log.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized { message } | ApiError::Rejected { message, .. } => message.clone(),
            ApiError::Transport(_) => "Сервер недоступен, попробуйте позже".to_string(),
            ApiError::Decode(_) => "Не смогли распарсить ответ".to_string(),
            ApiError::Encode(_) => "Не удалось подготовить запрос".to_string(),
        }
    }
}

/// Gateway operations the agent depends on.
#[async_trait]
pub trait VaultApi: Send + Sync {
    async fn register(&self, credentials: &Credentials) -> Result<AuthSession, ApiError>;

    async fn login(&self, credentials: &Credentials) -> Result<AuthSession, ApiError>;

    async fn list(&self, token: &str) -> Result<Vec<RecordSummary>, ApiError>;

    async fn get(&self, token: &str, id: &str) -> Result<Record, ApiError>;

    /// Sends one part of a record. Returns the stored record, without body.
    async fn upsert(&self, token: &str, record: &Record) -> Result<Record, ApiError>;
}
