//! The seam between typed rows and the generic CRUD statements.
//!
//! Every console table implements [`Table`]: its name, primary key, the
//! columns a write touches and how a payload binds onto them. Storage and
//! handlers are written once against the trait.

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::FromRow;
use sqlx::query::QueryAs;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};

use crate::error::TabloError;

pub type SqliteQueryAs<'q, O> = QueryAs<'q, Sqlite, O, SqliteArguments<'q>>;

pub trait Table:
    for<'r> FromRow<'r, SqliteRow> + Serialize + Send + Sync + Unpin + 'static
{
    /// Table name, also the REST path segment.
    const NAME: &'static str;
    /// Primary key column.
    const KEY: &'static str;
    /// Columns bound by [`Table::bind_insert`], in bind order.
    const INSERT_COLUMNS: &'static [&'static str];
    /// `SET` fragments bound by [`Table::bind_update`], in bind order.
    const UPDATE_ASSIGNMENTS: &'static [&'static str];

    type Payload: DeserializeOwned + Validate + Send + 'static;

    fn bind_insert<'q>(
        payload: Self::Payload,
        query: SqliteQueryAs<'q, Self>,
    ) -> Result<SqliteQueryAs<'q, Self>, TabloError>;

    fn bind_update<'q>(
        payload: Self::Payload,
        query: SqliteQueryAs<'q, Self>,
    ) -> Result<SqliteQueryAs<'q, Self>, TabloError>;

    fn key(&self) -> i64;

    /// Human readable label used by select boxes.
    fn label(&self) -> String;
}

pub trait Validate {
    fn validate(&self) -> Result<(), TabloError> {
        Ok(())
    }
}

/// Rejects missing or blank values for NOT NULL text columns.
pub fn require_text(field: &str, value: Option<&str>) -> Result<(), TabloError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(TabloError::Validation(format!("`{field}` is required"))),
    }
}

pub fn select_all_sql<T: Table>() -> String {
    format!("SELECT * FROM {} ORDER BY {}", T::NAME, T::KEY)
}

pub fn select_one_sql<T: Table>() -> String {
    format!("SELECT * FROM {} WHERE {} = ?", T::NAME, T::KEY)
}

pub fn insert_sql<T: Table>() -> String {
    let placeholders = vec!["?"; T::INSERT_COLUMNS.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        T::NAME,
        T::INSERT_COLUMNS.join(", "),
        placeholders
    )
}

pub fn update_sql<T: Table>() -> String {
    format!(
        "UPDATE {} SET {} WHERE {} = ? RETURNING *",
        T::NAME,
        T::UPDATE_ASSIGNMENTS.join(", "),
        T::KEY
    )
}

pub fn delete_sql<T: Table>() -> String {
    format!("DELETE FROM {} WHERE {} = ?", T::NAME, T::KEY)
}
