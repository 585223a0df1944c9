use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use keeper_protocol::{AuthReply, Credentials};
use std::sync::Arc;
use uuid::Uuid;

use crate::app::AppState;
use crate::crypto::{generate_user_key, hash_password, verify_password};
use crate::error::AppError;
use crate::store::{StoreError, User};

const MSG_MISSING_CREDENTIALS: &str = "Не передали логин или пароль!";
const MSG_DUPLICATE_USER: &str = "Данный пользователь уже зарегистрирован!";
const MSG_BAD_CREDENTIALS: &str = "Неправильные логин/пароль";
const MSG_REGISTERED: &str = "Вы успешно зарегистрированы и авторизованы!";
const MSG_LOGGED_IN: &str = "Вы успешно авторизованы!";

fn credentials(payload: Result<Json<Credentials>, JsonRejection>) -> Result<Credentials, AppError> {
    let Json(credentials) = payload.map_err(|e| {
        tracing::debug!("malformed credentials: {e}");
        AppError::bad_request()
    })?;
    if credentials.user_name.is_empty() || credentials.password.is_empty() {
        return Err(AppError::BadRequest(MSG_MISSING_CREDENTIALS.into()));
    }
    Ok(credentials)
}

fn auth_response(state: &AppState, reply: AuthReply) -> Result<Response, AppError> {
    let token = state.tokens.issue(&reply.id)?;
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| AppError::Internal(format!("token header: {e}")))?;
    headers.insert(AUTHORIZATION, value);
    Ok((StatusCode::OK, headers, Json(reply)).into_response())
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, AppError> {
    let credentials = credentials(payload)?;
    tracing::info!(user = %credentials.user_name, "Register request received");

    if state.store.user_by_name(&credentials.user_name).await?.is_some() {
        return Err(AppError::Conflict(MSG_DUPLICATE_USER.into()));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        name: credentials.user_name,
        password_hash: hash_password(credentials.password).await?,
        deleted: false,
    };
    match state.store.create_user(&user).await {
        Ok(()) => {}
        Err(StoreError::AlreadyExists(_)) => {
            return Err(AppError::Conflict(MSG_DUPLICATE_USER.into()))
        }
        Err(e) => return Err(e.into()),
    }

    auth_response(
        &state,
        AuthReply {
            id: user.id,
            msg: MSG_REGISTERED.into(),
            key: generate_user_key(),
        },
    )
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, AppError> {
    let credentials = credentials(payload)?;

    let user = match state.store.user_by_name(&credentials.user_name).await? {
        Some(user) if !user.deleted => user,
        _ => return Err(AppError::Unauthorized(MSG_BAD_CREDENTIALS.into())),
    };
    if !verify_password(credentials.password, user.password_hash.clone()).await? {
        return Err(AppError::Unauthorized(MSG_BAD_CREDENTIALS.into()));
    }
    tracing::info!(user = %user.name, "Login succeeded");

    auth_response(
        &state,
        AuthReply {
            id: user.id,
            msg: MSG_LOGGED_IN.into(),
            key: String::new(),
        },
    )
}
