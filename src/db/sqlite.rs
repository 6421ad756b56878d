use crate::db::schema::SQLITE_INIT;
use crate::db::table::{
    Table, Validate, delete_sql, insert_sql, select_all_sql, select_one_sql, update_sql,
};
use crate::error::TabloError;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::info;

pub type SqlitePool = Pool<Sqlite>;

/// One entry of a select box: primary key and display label.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecordOption {
    pub id: i64,
    pub label: String,
}

#[derive(Clone)]
pub struct TabloStorage {
    pool: SqlitePool,
}

impl TabloStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url` and apply the schema.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, TabloError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(connect_opts)
            .await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), TabloError> {
        // sqlx::query runs a single statement
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Any failure here means the database cannot be reached.
    pub async fn ping(&self) -> Result<(), TabloError> {
        let _: (i64,) = sqlx::query_as("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(TabloError::Unavailable)?;
        Ok(())
    }

    pub async fn list<T: Table>(&self) -> Result<Vec<T>, TabloError> {
        let sql = select_all_sql::<T>();
        let rows = sqlx::query_as::<_, T>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn get<T: Table>(&self, id: i64) -> Result<T, TabloError> {
        let sql = select_one_sql::<T>();
        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(TabloError::NotFound { table: T::NAME, id })
    }

    pub async fn insert<T: Table>(&self, payload: T::Payload) -> Result<T, TabloError> {
        payload.validate()?;
        let sql = insert_sql::<T>();
        let query = T::bind_insert(payload, sqlx::query_as::<_, T>(&sql))?;
        let row = query.fetch_one(&self.pool).await?;
        info!(table = T::NAME, id = row.key(), "record created");
        Ok(row)
    }

    pub async fn update<T: Table>(&self, id: i64, payload: T::Payload) -> Result<T, TabloError> {
        payload.validate()?;
        let sql = update_sql::<T>();
        let query = T::bind_update(payload, sqlx::query_as::<_, T>(&sql))?.bind(id);
        let row = query
            .fetch_optional(&self.pool)
            .await?
            .ok_or(TabloError::NotFound { table: T::NAME, id })?;
        info!(table = T::NAME, id, "record updated");
        Ok(row)
    }

    pub async fn delete<T: Table>(&self, id: i64) -> Result<(), TabloError> {
        let sql = delete_sql::<T>();
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match TabloError::from(e) {
                TabloError::InvalidReference(_) => TabloError::Conflict(format!(
                    "{} row {id} is still referenced by other records",
                    T::NAME
                )),
                other => other,
            })?;
        if result.rows_affected() == 0 {
            return Err(TabloError::NotFound { table: T::NAME, id });
        }
        info!(table = T::NAME, id, "record deleted");
        Ok(())
    }

    pub async fn options<T: Table>(&self) -> Result<Vec<RecordOption>, TabloError> {
        Ok(self
            .list::<T>()
            .await?
            .iter()
            .map(|row| RecordOption {
                id: row.key(),
                label: row.label(),
            })
            .collect())
    }
}
