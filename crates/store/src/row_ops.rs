//! The narrow row-ops interface the handler and the Change Tracker see.
//!
//! Entity-ORM semantics — column reflection, connection pooling, the
//! concrete table schema — are external collaborators (`# 1`); this trait
//! is the seam between them and the core. A row is a bag of named JSON
//! values that always carries an `"id"` entry: the handler-facing
//! [`ei_types::format_id`] string.

use async_trait::async_trait;

use crate::error::StoreError;
use ei_types::ColumnValues;

/// A single row, keyed by its `"id"` column.
pub type Row = ColumnValues;

/// Reads the `"id"` field out of a row, failing if absent — a row without
/// one cannot be tracked or rolled back.
pub fn row_id(table: &str, row: &Row) -> Result<String, StoreError> {
    match row.get("id") {
        Some(serde_json::Value::String(id)) => Ok(id.clone()),
        _ => Err(StoreError::MissingId { table: table.to_string(), id: "<unknown>".to_string() }),
    }
}

/// The store operations the handler performs, and the ones the Change
/// Tracker (`# 4.7`) wraps during HOT batches.
///
/// `upsert_rows` covers both `trackUpsert`'s insert-or-update semantics and
/// the Rollback Engine's `update`/`delete` reversal (both resolve to
/// "write this exact row"), so the trait only needs three mutating
/// operations plus a read.
#[async_trait]
pub trait StoreRowOps: Send {
    /// Reads back the current rows for `ids`, in no particular order.
    /// Absent ids are simply omitted from the result.
    async fn select_by_id(&mut self, table: &str, ids: &[String]) -> Result<Vec<Row>, StoreError>;

    /// Inserts `rows`, each of which must not already exist.
    async fn insert_rows(&mut self, table: &str, rows: Vec<Row>) -> Result<(), StoreError>;

    /// Inserts or overwrites `rows` by id.
    async fn upsert_rows(&mut self, table: &str, rows: Vec<Row>) -> Result<(), StoreError>;

    /// Deletes the rows identified by `ids`.
    async fn delete_rows(&mut self, table: &str, ids: &[String]) -> Result<(), StoreError>;
}
