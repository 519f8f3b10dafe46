//! Data access: the only way the service reaches the hosted store.
//!
//! `AppState` carries an `Arc<dyn DataClient>` built once in `main`. Handlers
//! that act for a signed-in user call `for_session` so the backend applies the
//! user's row-level policies.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Session;

#[cfg(test)]
pub mod memory;
pub mod postgrest;
pub mod query;

pub use query::{Filter, Query, Table};

pub type Row = Value;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No matching row in {table}")]
    NotFound { table: Table },
}

#[async_trait]
pub trait DataClient: Send + Sync {
    async fn fetch_rows(&self, table: Table, query: Query) -> Result<Vec<Row>, DataError>;

    async fn insert_row(&self, table: Table, fields: Value) -> Result<Row, DataError>;

    async fn insert_rows(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Row>, DataError>;

    async fn update_row(&self, table: Table, id: Uuid, fields: Value) -> Result<Row, DataError>;

    /// Insert or merge on primary key.
    async fn upsert_row(&self, table: Table, fields: Value) -> Result<Row, DataError>;

    async fn delete_row(&self, table: Table, id: Uuid) -> Result<(), DataError>;

    async fn delete_where(&self, table: Table, filters: Vec<Filter>) -> Result<(), DataError>;

    async fn invoke_procedure(&self, name: &str, args: Value) -> Result<Vec<Row>, DataError>;

    /// A client that authenticates as the given session's user.
    fn for_session(&self, session: &Session) -> Arc<dyn DataClient>;
}

/// Decodes a batch of rows into typed records.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, DataError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(DataError::Parse))
        .collect()
}

pub fn decode_row<T: DeserializeOwned>(row: Row) -> Result<T, DataError> {
    serde_json::from_value(row).map_err(DataError::Parse)
}

/// Decodes the first row, or reports `NotFound` for `table`.
pub fn decode_single<T: DeserializeOwned>(table: Table, rows: Vec<Row>) -> Result<T, DataError> {
    let row = rows
        .into_iter()
        .next()
        .ok_or(DataError::NotFound { table })?;
    decode_row(row)
}

/// Serializes an insert/update payload.
pub fn encode<T: Serialize>(payload: &T) -> Result<Value, DataError> {
    serde_json::to_value(payload).map_err(DataError::Parse)
}
