use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

pub const MSG_BAD_REQUEST: &str = "Ошибка в запросе";
pub const MSG_UNAUTHORIZED: &str = "Ошибка авторизации!";
const MSG_INTERNAL: &str = "Внутренняя ошибка сервера";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("blob storage: {0}")]
    Blob(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request() -> Self {
        AppError::BadRequest(MSG_BAD_REQUEST.into())
    }

    pub fn unauthorized() -> Self {
        AppError::Unauthorized(MSG_UNAUTHORIZED.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(_) | AppError::Blob(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            MSG_INTERNAL.to_string()
        } else {
            tracing::debug!(%status, error = %self, "request rejected");
            self.to_string()
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
