use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::{TabloError, router::TabloState};

/// GET /health -> 200 when the database answers, 503 otherwise.
pub async fn health_handler(State(state): State<TabloState>) -> Result<Json<Value>, TabloError> {
    state.storage.ping().await?;
    Ok(Json(json!({ "status": "ok", "database": "up" })))
}
