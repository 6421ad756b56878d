//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `table.rs`: the `Table` trait and the generic CRUD statements built from it
//! - `models.rs`: Rust structs mirroring DB rows, their write payloads and bindings
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: pool setup and the storage facade used by handlers

pub mod models;
pub mod schema;
pub mod sqlite;
pub mod table;

pub use models::{Assistant, AutoPrompt, DataPrepareModule, DatabaseInfo, Role, User};
pub use schema::SQLITE_INIT;
pub use sqlite::{RecordOption, SqlitePool, TabloStorage};
pub use table::{Table, Validate};
