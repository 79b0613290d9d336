//! A Postgres-backed implementation of the row-ops interface and the
//! internal status/hot-block/change-log tables (`# 6`).
//!
//! Column reflection is explicitly out of scope (`# 1`): every non-`id`
//! column is modeled as a single `jsonb` value, so a row round-trips as a
//! bag of named JSON values without the store needing per-table typed
//! schemas. `id` is the one column assumed to be `text`.

use alloy::primitives::B256;
use async_trait::async_trait;
use ei_types::ChangeRecord;
use sqlx::{postgres::PgRow, Column, Postgres, Row as _, Transaction};
use tracing::instrument;

use crate::{
    change_log::{ChangeLogSink, ChangeLogSource},
    error::StoreError,
    ident::quote_ident,
    row_ops::{Row, StoreRowOps},
    status::StatusStore,
};

/// Connection pool entry point; `begin` opens the one transaction a batch
/// runs inside (`# 5`: "the store connection is exclusively held by the
/// handler and tracker during a batch transaction").
pub struct PgStore {
    pool: sqlx::PgPool,
    schema: String,
}

impl PgStore {
    pub fn new(pool: sqlx::PgPool, schema: impl Into<String>) -> Self {
        Self { pool, schema: schema.into() }
    }

    #[instrument(skip(self))]
    pub async fn begin(&self) -> Result<PgTx<'_>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(PgTx { tx, schema: self.schema.clone() })
    }
}

/// One batch's transaction, implementing every trait the Runner,
/// ChangeTracker, and RollbackEngine need.
pub struct PgTx<'c> {
    tx: Transaction<'c, Postgres>,
    schema: String,
}

impl<'c> PgTx<'c> {
    pub async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(StoreError::from)
    }

    pub async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await.map_err(StoreError::from)
    }

    fn qualified(&self, table: &str) -> Result<String, StoreError> {
        Ok(format!("{}.{}", quote_ident(&self.schema)?, quote_ident(table)?))
    }
}

fn decode_row(pg_row: &PgRow) -> Result<Row, StoreError> {
    let mut fields = Row::new();
    for column in pg_row.columns() {
        let name = column.name();
        if name == "id" {
            let id: String = pg_row.try_get(name)?;
            fields.insert("id".to_string(), serde_json::Value::String(id));
        } else {
            let sqlx::types::Json(value): sqlx::types::Json<serde_json::Value> = pg_row.try_get(name)?;
            fields.insert(name.to_string(), value);
        }
    }
    Ok(fields)
}

fn row_value(table: &str, row: &Row, key: &str) -> Result<serde_json::Value, StoreError> {
    row.get(key)
        .cloned()
        .ok_or_else(|| StoreError::MissingId { table: table.to_string(), id: key.to_string() })
}

#[async_trait]
impl<'c> StoreRowOps for PgTx<'c> {
    #[instrument(skip(self, ids), fields(table))]
    async fn select_by_id(&mut self, table: &str, ids: &[String]) -> Result<Vec<Row>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let quoted = quote_ident(table)?;
        let sql = format!("SELECT * FROM {quoted} WHERE id = ANY($1)");
        let rows = sqlx::query(&sql).bind(ids).fetch_all(&mut *self.tx).await?;
        rows.iter().map(decode_row).collect()
    }

    #[instrument(skip(self, rows), fields(table, rows = rows.len()))]
    async fn insert_rows(&mut self, table: &str, rows: Vec<Row>) -> Result<(), StoreError> {
        let quoted = quote_ident(table)?;
        for row in rows {
            let id = row_value(table, &row, "id")?;
            let mut columns = Vec::with_capacity(row.len());
            let mut placeholders = Vec::with_capacity(row.len());
            for (index, key) in row.keys().enumerate() {
                columns.push(quote_ident(key)?);
                placeholders.push(format!("${}", index + 1));
            }
            let sql = format!(
                "INSERT INTO {quoted} ({}) VALUES ({})",
                columns.join(", "),
                placeholders.join(", ")
            );
            let mut query = sqlx::query(&sql);
            for (key, value) in &row {
                query = bind_value(query, key, value, &id)?;
            }
            query.execute(&mut *self.tx).await?;
        }
        Ok(())
    }

    #[instrument(skip(self, rows), fields(table, rows = rows.len()))]
    async fn upsert_rows(&mut self, table: &str, rows: Vec<Row>) -> Result<(), StoreError> {
        let quoted = quote_ident(table)?;
        for row in rows {
            let id = row_value(table, &row, "id")?;
            let mut columns = Vec::with_capacity(row.len());
            let mut placeholders = Vec::with_capacity(row.len());
            let mut updates = Vec::with_capacity(row.len());
            for (index, key) in row.keys().enumerate() {
                let quoted_col = quote_ident(key)?;
                placeholders.push(format!("${}", index + 1));
                if key != "id" {
                    updates.push(format!("{quoted_col} = EXCLUDED.{quoted_col}"));
                }
                columns.push(quoted_col);
            }
            let sql = format!(
                "INSERT INTO {quoted} ({cols}) VALUES ({vals}) ON CONFLICT (id) DO UPDATE SET {updates}",
                cols = columns.join(", "),
                vals = placeholders.join(", "),
                updates = updates.join(", "),
            );
            let mut query = sqlx::query(&sql);
            for (key, value) in &row {
                query = bind_value(query, key, value, &id)?;
            }
            query.execute(&mut *self.tx).await?;
        }
        Ok(())
    }

    #[instrument(skip(self, ids), fields(table, rows = ids.len()))]
    async fn delete_rows(&mut self, table: &str, ids: &[String]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let quoted = quote_ident(table)?;
        let sql = format!("DELETE FROM {quoted} WHERE id = ANY($1)");
        sqlx::query(&sql).bind(ids).execute(&mut *self.tx).await?;
        Ok(())
    }
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments>,
    key: &'q str,
    value: &serde_json::Value,
    id: &serde_json::Value,
) -> Result<sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments>, StoreError> {
    if key == "id" {
        let id = id.as_str().ok_or_else(|| StoreError::InvalidIdentifier("id".to_string()))?;
        Ok(query.bind(id.to_string()))
    } else {
        Ok(query.bind(sqlx::types::Json(value.clone())))
    }
}

#[async_trait]
impl<'c> ChangeLogSink for PgTx<'c> {
    #[instrument(skip(self, records), fields(block_height, start_index, len = records.len()))]
    async fn append_change_log(
        &mut self,
        block_height: u64,
        start_index: u32,
        records: &[ChangeRecord],
    ) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        let table = self.qualified("hot_change_log")?;
        let sql = format!("INSERT INTO {table} (block_height, index, change) VALUES ($1, $2, $3)");
        for (offset, record) in records.iter().enumerate() {
            let index = start_index + offset as u32;
            let json = serde_json::to_value(record)?;
            sqlx::query(&sql)
                .bind(block_height as i64)
                .bind(index as i32)
                .bind(sqlx::types::Json(json))
                .execute(&mut *self.tx)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<'c> ChangeLogSource for PgTx<'c> {
    #[instrument(skip(self), fields(block_height))]
    async fn load_change_log_desc(&mut self, block_height: u64) -> Result<Vec<ChangeRecord>, StoreError> {
        let table = self.qualified("hot_change_log")?;
        let sql = format!("SELECT change FROM {table} WHERE block_height = $1 ORDER BY index DESC");
        let rows = sqlx::query(&sql).bind(block_height as i64).fetch_all(&mut *self.tx).await?;
        rows.into_iter()
            .map(|row| {
                let sqlx::types::Json(value): sqlx::types::Json<serde_json::Value> = row.try_get("change")?;
                Ok(serde_json::from_value(value)?)
            })
            .collect()
    }
}

#[async_trait]
impl<'c> StatusStore for PgTx<'c> {
    #[instrument(skip(self))]
    async fn load_committed(&mut self) -> Result<Option<(u64, B256)>, StoreError> {
        let table = self.qualified("status")?;
        let sql = format!("SELECT height, hash FROM {table} LIMIT 1");
        let row = sqlx::query(&sql).fetch_optional(&mut *self.tx).await?;
        let Some(row) = row else { return Ok(None) };
        let height: i64 = row.try_get("height")?;
        let hash: Vec<u8> = row.try_get("hash")?;
        Ok(Some((height as u64, B256::from_slice(&hash))))
    }

    #[instrument(skip(self), fields(height))]
    async fn commit_status(&mut self, height: u64, hash: B256) -> Result<(), StoreError> {
        let table = self.qualified("status")?;
        let sql = format!(
            "INSERT INTO {table} (id, height, hash) VALUES (0, $1, $2) \
             ON CONFLICT (id) DO UPDATE SET height = EXCLUDED.height, hash = EXCLUDED.hash"
        );
        sqlx::query(&sql).bind(height as i64).bind(hash.as_slice()).execute(&mut *self.tx).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(height))]
    async fn insert_hot_block(&mut self, height: u64, hash: B256) -> Result<(), StoreError> {
        let table = self.qualified("hot_block")?;
        let sql = format!(
            "INSERT INTO {table} (height, hash) VALUES ($1, $2) \
             ON CONFLICT (height) DO UPDATE SET hash = EXCLUDED.hash"
        );
        sqlx::query(&sql).bind(height as i64).bind(hash.as_slice()).execute(&mut *self.tx).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn hot_blocks_desc(&mut self) -> Result<Vec<(u64, B256)>, StoreError> {
        let table = self.qualified("hot_block")?;
        let sql = format!("SELECT height, hash FROM {table} ORDER BY height DESC");
        let rows = sqlx::query(&sql).fetch_all(&mut *self.tx).await?;
        rows.into_iter()
            .map(|row| {
                let height: i64 = row.try_get("height")?;
                let hash: Vec<u8> = row.try_get("hash")?;
                Ok((height as u64, B256::from_slice(&hash)))
            })
            .collect()
    }

    #[instrument(skip(self), fields(height))]
    async fn delete_hot_block(&mut self, height: u64) -> Result<(), StoreError> {
        let table = self.qualified("hot_block")?;
        let sql = format!("DELETE FROM {table} WHERE height = $1");
        sqlx::query(&sql).bind(height as i64).execute(&mut *self.tx).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(height))]
    async fn purge_finalized_below(&mut self, height: u64) -> Result<(), StoreError> {
        let hot_block = self.qualified("hot_block")?;
        let change_log = self.qualified("hot_change_log")?;
        sqlx::query(&format!("DELETE FROM {change_log} WHERE block_height <= $1"))
            .bind(height as i64)
            .execute(&mut *self.tx)
            .await?;
        sqlx::query(&format!("DELETE FROM {hot_block} WHERE height <= $1"))
            .bind(height as i64)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }
}
