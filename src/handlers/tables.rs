use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::collections::HashMap;

use crate::catalog::{TABLES, TableSpec, TableView};
use crate::db::{Assistant, AutoPrompt, DataPrepareModule, DatabaseInfo, Role, Table, User};
use crate::middleware::{ApiJson, ApiPath};
use crate::{TabloError, router::TabloState};

/// Raw form inputs keyed by field name.
pub type FormInput = HashMap<String, String>;

/// Run `$body` with `$t` bound to the row type behind `$endpoint`.
macro_rules! with_table {
    ($endpoint:expr, $t:ident => $body:expr) => {
        match $endpoint {
            "roles" => {
                type $t = Role;
                $body
            }
            "users" => {
                type $t = User;
                $body
            }
            "database_info" => {
                type $t = DatabaseInfo;
                $body
            }
            "data_prepare_modules" => {
                type $t = DataPrepareModule;
                $body
            }
            "assistants" => {
                type $t = Assistant;
                $body
            }
            "auto_prompt" => {
                type $t = AutoPrompt;
                $body
            }
            other => Err(TabloError::UnknownTable(other.to_string())),
        }
    };
}

/// GET /tables
pub async fn list_tables() -> Json<Vec<TableView>> {
    Json(TABLES.iter().map(TableView::from).collect())
}

/// GET /tables/{endpoint}
pub async fn get_table(
    ApiPath(endpoint): ApiPath<String>,
) -> Result<Json<TableView>, TabloError> {
    Ok(Json(TableSpec::find(&endpoint)?.into()))
}

/// POST /forms/{endpoint}
pub async fn submit_create_form(
    State(state): State<TabloState>,
    ApiPath(endpoint): ApiPath<String>,
    ApiJson(form): ApiJson<FormInput>,
) -> Result<Response, TabloError> {
    let spec = TableSpec::find(&endpoint)?;
    let payload = spec.coerce_form(&form)?;
    with_table!(spec.endpoint, T => {
        let row = state.storage.insert::<T>(payload_from::<T>(payload)?).await?;
        Ok((StatusCode::CREATED, Json(row)).into_response())
    })
}

/// PUT /forms/{endpoint}/{id}
pub async fn submit_update_form(
    State(state): State<TabloState>,
    ApiPath((endpoint, id)): ApiPath<(String, i64)>,
    ApiJson(form): ApiJson<FormInput>,
) -> Result<Response, TabloError> {
    let spec = TableSpec::find(&endpoint)?;
    let payload = spec.coerce_form(&form)?;
    with_table!(spec.endpoint, T => {
        let row = state.storage.update::<T>(id, payload_from::<T>(payload)?).await?;
        Ok(Json(row).into_response())
    })
}

fn payload_from<T: Table>(value: Value) -> Result<T::Payload, TabloError> {
    serde_json::from_value(value).map_err(|e| TabloError::Validation(e.to_string()))
}
