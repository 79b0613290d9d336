//! Rollback Engine (C8): inverts a block's recorded mutations when a reorg
//! invalidates it.

use ei_types::ChangeRecord;
use tracing::instrument;

use crate::{
    change_log::ChangeLogSource,
    error::RollbackError,
    row_ops::{row_id, StoreRowOps},
    status::StatusStore,
};

/// Reads a block's change log and undoes it, then drops the block's
/// hot-block bookkeeping row — all within the caller's transaction
/// (`# 4.8`).
pub struct RollbackEngine;

impl RollbackEngine {
    /// Rolls back every mutation recorded for `block_height`, in reverse
    /// (`index DESC`) order, then removes its `hot_block` row.
    ///
    /// A missing pre-image or an un-escapable identifier is an invariant
    /// violation (`# 7`): a partial rollback would corrupt the data view,
    /// so this method never continues past the first such error.
    #[instrument(skip(store), fields(block_height))]
    pub async fn rollback_block<S>(store: &mut S, block_height: u64) -> Result<(), RollbackError>
    where
        S: StoreRowOps + ChangeLogSource + StatusStore,
    {
        let records = store.load_change_log_desc(block_height).await?;
        for record in records {
            Self::invert(store, block_height, record).await?;
        }
        store.delete_hot_block(block_height).await?;
        Ok(())
    }

    async fn invert<S>(store: &mut S, block_height: u64, record: ChangeRecord) -> Result<(), RollbackError>
    where
        S: StoreRowOps,
    {
        match record {
            ChangeRecord::Insert { table, id } => {
                store.delete_rows(&table, &[id]).await?;
            }
            ChangeRecord::Update { table, id, prior_fields } => {
                verify_id_matches(block_height, &table, &id, &prior_fields)?;
                store.upsert_rows(&table, vec![prior_fields]).await?;
            }
            ChangeRecord::Delete { table, id, prior_fields } => {
                verify_id_matches(block_height, &table, &id, &prior_fields)?;
                store.insert_rows(&table, vec![prior_fields]).await?;
            }
        }
        Ok(())
    }
}

/// Confirms the pre-image's own `id` field agrees with the change record's
/// `id` — a mismatch means the recorded pre-image is corrupt, which must
/// abort the rollback rather than silently restore the wrong row.
fn verify_id_matches(
    block_height: u64,
    table: &str,
    id: &str,
    prior_fields: &ei_types::ColumnValues,
) -> Result<(), RollbackError> {
    match row_id(table, prior_fields) {
        Ok(recorded_id) if recorded_id == id => Ok(()),
        _ => Err(RollbackError::Invariant {
            height: block_height,
            reason: format!("missing or mismatched pre-image for {table}.{id}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_log::ChangeLogSink;
    use crate::row_ops::Row;
    use async_trait::async_trait;
    use ei_types::ChangeRecord;
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};

    #[derive(Default)]
    struct FakeStore {
        tables: HashMap<String, HashMap<String, Row>>,
        log: HashMap<u64, Vec<ChangeRecord>>,
        hot_blocks: Vec<u64>,
    }

    #[async_trait]
    impl StoreRowOps for FakeStore {
        async fn select_by_id(&mut self, table: &str, ids: &[String]) -> Result<Vec<Row>, crate::error::StoreError> {
            let Some(rows) = self.tables.get(table) else { return Ok(vec![]) };
            Ok(ids.iter().filter_map(|id| rows.get(id).cloned()).collect())
        }
        async fn insert_rows(&mut self, table: &str, rows: Vec<Row>) -> Result<(), crate::error::StoreError> {
            let entry = self.tables.entry(table.to_string()).or_default();
            for row in rows {
                entry.insert(row_id(table, &row)?, row);
            }
            Ok(())
        }
        async fn upsert_rows(&mut self, table: &str, rows: Vec<Row>) -> Result<(), crate::error::StoreError> {
            self.insert_rows(table, rows).await
        }
        async fn delete_rows(&mut self, table: &str, ids: &[String]) -> Result<(), crate::error::StoreError> {
            if let Some(rows) = self.tables.get_mut(table) {
                for id in ids {
                    rows.remove(id);
                }
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ChangeLogSink for FakeStore {
        async fn append_change_log(
            &mut self,
            block_height: u64,
            _start_index: u32,
            records: &[ChangeRecord],
        ) -> Result<(), crate::error::StoreError> {
            self.log.entry(block_height).or_default().extend(records.iter().cloned());
            Ok(())
        }
    }

    #[async_trait]
    impl ChangeLogSource for FakeStore {
        async fn load_change_log_desc(&mut self, block_height: u64) -> Result<Vec<ChangeRecord>, crate::error::StoreError> {
            let mut records = self.log.get(&block_height).cloned().unwrap_or_default();
            records.reverse();
            Ok(records)
        }
    }

    #[async_trait]
    impl StatusStore for FakeStore {
        async fn load_committed(&mut self) -> Result<Option<(u64, alloy::primitives::B256)>, crate::error::StoreError> {
            Ok(None)
        }
        async fn commit_status(&mut self, _height: u64, _hash: alloy::primitives::B256) -> Result<(), crate::error::StoreError> {
            Ok(())
        }
        async fn insert_hot_block(&mut self, height: u64, _hash: alloy::primitives::B256) -> Result<(), crate::error::StoreError> {
            self.hot_blocks.push(height);
            Ok(())
        }
        async fn hot_blocks_desc(&mut self) -> Result<Vec<(u64, alloy::primitives::B256)>, crate::error::StoreError> {
            Ok(vec![])
        }
        async fn delete_hot_block(&mut self, height: u64) -> Result<(), crate::error::StoreError> {
            self.hot_blocks.retain(|h| *h != height);
            Ok(())
        }
        async fn purge_finalized_below(&mut self, _height: u64) -> Result<(), crate::error::StoreError> {
            Ok(())
        }
    }

    fn row(id: &str, value: i64) -> Row {
        let mut fields = BTreeMap::new();
        fields.insert("id".to_string(), json!(id));
        fields.insert("value".to_string(), json!(value));
        fields
    }

    #[tokio::test]
    async fn rollback_restores_pre_insert_state() {
        let mut store = FakeStore::default();
        store.hot_blocks.push(10);
        {
            let mut tracker = crate::ChangeTracker::new(&mut store, 10);
            tracker.insert_rows("accounts", vec![row("a", 1)]).await.unwrap();
        }

        RollbackEngine::rollback_block(&mut store, 10).await.unwrap();

        assert!(store.tables.get("accounts").map(|t| t.is_empty()).unwrap_or(true));
        assert!(!store.hot_blocks.contains(&10));
    }

    #[tokio::test]
    async fn rollback_restores_pre_update_value() {
        let mut store = FakeStore::default();
        store.insert_rows("accounts", vec![row("a", 1)]).await.unwrap();
        {
            let mut tracker = crate::ChangeTracker::new(&mut store, 10);
            tracker.upsert_rows("accounts", vec![row("a", 2)]).await.unwrap();
        }
        assert_eq!(store.tables["accounts"]["a"].get("value"), Some(&json!(2)));

        RollbackEngine::rollback_block(&mut store, 10).await.unwrap();

        assert_eq!(store.tables["accounts"]["a"].get("value"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn rollback_restores_deleted_row() {
        let mut store = FakeStore::default();
        store.insert_rows("accounts", vec![row("a", 9)]).await.unwrap();
        {
            let mut tracker = crate::ChangeTracker::new(&mut store, 10);
            tracker.delete_rows("accounts", &["a".to_string()]).await.unwrap();
        }
        assert!(store.tables["accounts"].get("a").is_none());

        RollbackEngine::rollback_block(&mut store, 10).await.unwrap();

        assert_eq!(store.tables["accounts"]["a"].get("value"), Some(&json!(9)));
    }

    #[tokio::test]
    async fn multiple_operations_invert_in_reverse_order() {
        let mut store = FakeStore::default();
        {
            let mut tracker = crate::ChangeTracker::new(&mut store, 10);
            tracker.insert_rows("accounts", vec![row("a", 1)]).await.unwrap();
            tracker.upsert_rows("accounts", vec![row("a", 2)]).await.unwrap();
            tracker.delete_rows("accounts", &["a".to_string()]).await.unwrap();
        }
        assert!(store.tables["accounts"].get("a").is_none());

        RollbackEngine::rollback_block(&mut store, 10).await.unwrap();

        // Net effect of insert(1) -> update(2) -> delete, inverted in
        // reverse, is a full no-op: the row never existed before this
        // block, so it must not exist after rollback either.
        assert!(store.tables["accounts"].get("a").is_none());
    }
}
