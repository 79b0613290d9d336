//! Change Tracker (C7): wraps the store's row-ops interface during HOT
//! batches, recording every mutation into the side log before it lands.

use std::collections::HashMap;

use async_trait::async_trait;
use ei_types::ChangeRecord;
use tracing::instrument;

use crate::{
    change_log::ChangeLogSink,
    error::StoreError,
    row_ops::{row_id, Row, StoreRowOps},
};

/// Wraps a row-ops-and-change-log-capable store for the duration of one
/// unfinalized block, so every `insert`/`upsert`/`delete` the handler
/// performs is recorded before it is applied.
///
/// The per-block index (`# 3`, `# 4.7`) is monotonically increasing across
/// however many tracked operations the handler issues against this block;
/// a fresh [`ChangeTracker`] is constructed per block.
pub struct ChangeTracker<'a, S> {
    inner: &'a mut S,
    block_height: u64,
    next_index: u32,
}

impl<'a, S> ChangeTracker<'a, S>
where
    S: StoreRowOps + ChangeLogSink,
{
    pub fn new(inner: &'a mut S, block_height: u64) -> Self {
        Self { inner, block_height, next_index: 0 }
    }

    /// The next free per-block change-log index, exposed for tests that
    /// assert on the tracker's bookkeeping rather than its side effects.
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    async fn record(&mut self, records: Vec<ChangeRecord>) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        let start_index = self.next_index;
        self.next_index += records.len() as u32;
        self.inner.append_change_log(self.block_height, start_index, &records).await
    }
}

#[async_trait]
impl<'a, S> StoreRowOps for ChangeTracker<'a, S>
where
    S: StoreRowOps + ChangeLogSink,
{
    async fn select_by_id(&mut self, table: &str, ids: &[String]) -> Result<Vec<Row>, StoreError> {
        self.inner.select_by_id(table, ids).await
    }

    #[instrument(skip(self, rows), fields(table, rows = rows.len()))]
    async fn insert_rows(&mut self, table: &str, rows: Vec<Row>) -> Result<(), StoreError> {
        let records = rows
            .iter()
            .map(|row| row_id(table, row).map(|id| ChangeRecord::Insert { table: table.to_string(), id }))
            .collect::<Result<Vec<_>, _>>()?;
        self.record(records).await?;
        self.inner.insert_rows(table, rows).await
    }

    #[instrument(skip(self, rows), fields(table, rows = rows.len()))]
    async fn upsert_rows(&mut self, table: &str, rows: Vec<Row>) -> Result<(), StoreError> {
        let ids = rows.iter().map(|row| row_id(table, row)).collect::<Result<Vec<_>, _>>()?;
        let existing: HashMap<String, Row> = self
            .inner
            .select_by_id(table, &ids)
            .await?
            .into_iter()
            .map(|row| row_id(table, &row).map(|id| (id, row)))
            .collect::<Result<_, _>>()?;

        let mut records = Vec::with_capacity(rows.len());
        for id in &ids {
            let record = match existing.get(id) {
                Some(prior) => {
                    ChangeRecord::Update { table: table.to_string(), id: id.clone(), prior_fields: prior.clone() }
                }
                None => ChangeRecord::Insert { table: table.to_string(), id: id.clone() },
            };
            records.push(record);
        }
        self.record(records).await?;
        self.inner.upsert_rows(table, rows).await
    }

    #[instrument(skip(self, ids), fields(table, rows = ids.len()))]
    async fn delete_rows(&mut self, table: &str, ids: &[String]) -> Result<(), StoreError> {
        let existing = self.inner.select_by_id(table, ids).await?;
        let records = existing
            .into_iter()
            .map(|row| row_id(table, &row).map(|id| ChangeRecord::Delete { table: table.to_string(), id, prior_fields: row }))
            .collect::<Result<Vec<_>, _>>()?;
        self.record(records).await?;
        self.inner.delete_rows(table, ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    /// A minimal in-memory store used only to exercise the tracker's
    /// bookkeeping, not the real Postgres wiring.
    #[derive(Default)]
    struct FakeStore {
        tables: HashMap<String, HashMap<String, Row>>,
        log: Vec<(u64, u32, ChangeRecord)>,
    }

    #[async_trait]
    impl StoreRowOps for FakeStore {
        async fn select_by_id(&mut self, table: &str, ids: &[String]) -> Result<Vec<Row>, StoreError> {
            let Some(rows) = self.tables.get(table) else { return Ok(vec![]) };
            Ok(ids.iter().filter_map(|id| rows.get(id).cloned()).collect())
        }

        async fn insert_rows(&mut self, table: &str, rows: Vec<Row>) -> Result<(), StoreError> {
            let entry = self.tables.entry(table.to_string()).or_default();
            for row in rows {
                entry.insert(row_id(table, &row)?, row);
            }
            Ok(())
        }

        async fn upsert_rows(&mut self, table: &str, rows: Vec<Row>) -> Result<(), StoreError> {
            self.insert_rows(table, rows).await
        }

        async fn delete_rows(&mut self, table: &str, ids: &[String]) -> Result<(), StoreError> {
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
            start_index: u32,
            records: &[ChangeRecord],
        ) -> Result<(), StoreError> {
            for (offset, record) in records.iter().enumerate() {
                self.log.push((block_height, start_index + offset as u32, record.clone()));
            }
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
    async fn insert_is_recorded_as_an_insert_record() {
        let mut store = FakeStore::default();
        let mut tracker = ChangeTracker::new(&mut store, 10);
        tracker.insert_rows("accounts", vec![row("a", 1)]).await.unwrap();
        assert_eq!(store.log.len(), 1);
        assert!(matches!(&store.log[0].2, ChangeRecord::Insert { id, .. } if id == "a"));
    }

    #[tokio::test]
    async fn upsert_of_existing_row_captures_its_pre_image() {
        let mut store = FakeStore::default();
        store.insert_rows("accounts", vec![row("a", 1)]).await.unwrap();

        let mut tracker = ChangeTracker::new(&mut store, 10);
        tracker.upsert_rows("accounts", vec![row("a", 2)]).await.unwrap();

        assert_eq!(store.log.len(), 1);
        match &store.log[0].2 {
            ChangeRecord::Update { prior_fields, .. } => {
                assert_eq!(prior_fields.get("value"), Some(&json!(1)))
            }
            other => panic!("expected an update record, got {other:?}"),
        }
        assert_eq!(store.tables["accounts"]["a"].get("value"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn delete_captures_the_full_pre_image() {
        let mut store = FakeStore::default();
        store.insert_rows("accounts", vec![row("a", 7)]).await.unwrap();

        let mut tracker = ChangeTracker::new(&mut store, 10);
        tracker.delete_rows("accounts", &["a".to_string()]).await.unwrap();

        match &store.log[0].2 {
            ChangeRecord::Delete { prior_fields, .. } => {
                assert_eq!(prior_fields.get("value"), Some(&json!(7)))
            }
            other => panic!("expected a delete record, got {other:?}"),
        }
        assert!(store.tables["accounts"].get("a").is_none());
    }

    #[tokio::test]
    async fn index_advances_monotonically_across_operations() {
        let mut store = FakeStore::default();
        let mut tracker = ChangeTracker::new(&mut store, 10);
        tracker.insert_rows("a", vec![row("1", 0)]).await.unwrap();
        tracker.insert_rows("a", vec![row("2", 0), row("3", 0)]).await.unwrap();
        assert_eq!(tracker.next_index(), 3);
    }
}
