use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::db::{RecordOption, Table};
use crate::middleware::{ApiJson, ApiPath};
use crate::{TabloError, router::TabloState};

/// GET /{table}
pub async fn list_records<T: Table>(
    State(state): State<TabloState>,
) -> Result<Json<Vec<T>>, TabloError> {
    Ok(Json(state.storage.list::<T>().await?))
}

/// GET /{table}/{id}
pub async fn get_record<T: Table>(
    State(state): State<TabloState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<T>, TabloError> {
    Ok(Json(state.storage.get::<T>(id).await?))
}

/// POST /{table}
pub async fn create_record<T: Table>(
    State(state): State<TabloState>,
    ApiJson(payload): ApiJson<T::Payload>,
) -> Result<(StatusCode, Json<T>), TabloError> {
    let row = state.storage.insert::<T>(payload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /{table}/{id}
pub async fn update_record<T: Table>(
    State(state): State<TabloState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<T::Payload>,
) -> Result<Json<T>, TabloError> {
    Ok(Json(state.storage.update::<T>(id, payload).await?))
}

/// DELETE /{table}/{id}
pub async fn delete_record<T: Table>(
    State(state): State<TabloState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>, TabloError> {
    state.storage.delete::<T>(id).await?;
    Ok(Json(json!({ "status": "deleted", "id": id })))
}

/// GET /{table}/options
pub async fn record_options<T: Table>(
    State(state): State<TabloState>,
) -> Result<Json<Vec<RecordOption>>, TabloError> {
    Ok(Json(state.storage.options::<T>().await?))
}
