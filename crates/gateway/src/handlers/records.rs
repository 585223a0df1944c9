use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use keeper_protocol::{Record, RecordRef, RecordSummary};
use std::sync::Arc;

use crate::app::AppState;
use crate::auth::authenticate;
use crate::error::AppError;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(value)| value).map_err(|e| {
        tracing::debug!("malformed request body: {e}");
        AppError::bad_request()
    })
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<RecordSummary>>, AppError> {
    let user_id = authenticate(&headers, &state.tokens, state.store.as_ref()).await?;
    Ok(Json(state.records.list(&user_id).await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<RecordRef>, JsonRejection>,
) -> Result<Json<Record>, AppError> {
    let user_id = authenticate(&headers, &state.tokens, state.store.as_ref()).await?;
    let RecordRef { id } = body(payload)?;
    Ok(Json(state.records.get(&user_id, &id).await?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<Record>, JsonRejection>,
) -> Result<Json<Record>, AppError> {
    let user_id = authenticate(&headers, &state.tokens, state.store.as_ref()).await?;
    let record = body(payload)?;
    Ok(Json(state.records.upsert(&user_id, record).await?))
}
