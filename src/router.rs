use axum::{
    Router,
    middleware::from_extractor_with_state,
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::db::{
    Assistant, AutoPrompt, DataPrepareModule, DatabaseInfo, Role, Table, TabloStorage, User,
};
use crate::handlers::health::health_handler;
use crate::handlers::records::{
    create_record, delete_record, get_record, list_records, record_options, update_record,
};
use crate::handlers::tables::{get_table, list_tables, submit_create_form, submit_update_form};
use crate::middleware::RequireConsoleKey;

#[derive(Clone)]
pub struct TabloState {
    pub storage: TabloStorage,
    pub console_key: Option<Arc<str>>,
}

impl TabloState {
    pub fn new(storage: TabloStorage, console_key: Option<Arc<str>>) -> Self {
        Self {
            storage,
            console_key,
        }
    }
}

/// CRUD routes for one table, mounted at `/{T::NAME}`.
fn table_routes<T: Table>() -> Router<TabloState> {
    let collection = format!("/{}", T::NAME);
    let options = format!("/{}/options", T::NAME);
    let item = format!("/{}/{{id}}", T::NAME);
    Router::new()
        .route(&collection, get(list_records::<T>).post(create_record::<T>))
        .route(&options, get(record_options::<T>))
        .route(
            &item,
            get(get_record::<T>)
                .put(update_record::<T>)
                .delete(delete_record::<T>),
        )
}

pub fn tablo_router(state: TabloState) -> Router {
    let console = Router::new()
        .merge(table_routes::<Role>())
        .merge(table_routes::<User>())
        .merge(table_routes::<DatabaseInfo>())
        .merge(table_routes::<DataPrepareModule>())
        .merge(table_routes::<Assistant>())
        .merge(table_routes::<AutoPrompt>())
        .route("/tables", get(list_tables))
        .route("/tables/{endpoint}", get(get_table))
        .route("/forms/{endpoint}", post(submit_create_form))
        .route("/forms/{endpoint}/{id}", put(submit_update_form))
        .route_layer(from_extractor_with_state::<RequireConsoleKey, TabloState>(
            state.clone(),
        ));

    Router::new()
        .merge(console)
        .route("/health", get(health_handler))
        .with_state(state)
}
