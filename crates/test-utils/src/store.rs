//! An in-memory [`ei_store::TransactionalStore`], so Runner tests never
//! need a live Postgres instance.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use alloy::primitives::B256;
use async_trait::async_trait;
use ei_store::{
    row_id, ChangeLogSink, ChangeLogSource, Row, StatusStore, StoreError, StoreRowOps,
    TransactionalStore,
};
use ei_types::ChangeRecord;
use futures::future::BoxFuture;
use parking_lot::Mutex;

#[derive(Default)]
struct Inner {
    tables: HashMap<String, HashMap<String, Row>>,
    change_log: BTreeMap<u64, Vec<ChangeRecord>>,
    status: Option<(u64, B256)>,
    hot_blocks: BTreeMap<u64, B256>,
}

/// A row-ops store backed by a `Mutex`-guarded in-memory map.
///
/// Every operation commits immediately against the shared state: there is
/// no isolation between an in-flight `Tx` and the store it was opened from,
/// which is fine for a fixture whose job is exercising handler and Runner
/// logic, not concurrent-transaction semantics.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots a table's current rows, for test assertions.
    pub fn table(&self, name: &str) -> HashMap<String, Row> {
        self.inner.lock().tables.get(name).cloned().unwrap_or_default()
    }
}

pub struct InMemoryTx<'a> {
    inner: &'a Mutex<Inner>,
}

#[async_trait]
impl StoreRowOps for InMemoryTx<'_> {
    async fn select_by_id(&mut self, table: &str, ids: &[String]) -> Result<Vec<Row>, StoreError> {
        let inner = self.inner.lock();
        let Some(rows) = inner.tables.get(table) else { return Ok(vec![]) };
        Ok(ids.iter().filter_map(|id| rows.get(id).cloned()).collect())
    }

    async fn insert_rows(&mut self, table: &str, rows: Vec<Row>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let entry = inner.tables.entry(table.to_string()).or_default();
        for row in rows {
            entry.insert(row_id(table, &row)?, row);
        }
        Ok(())
    }

    async fn upsert_rows(&mut self, table: &str, rows: Vec<Row>) -> Result<(), StoreError> {
        self.insert_rows(table, rows).await
    }

    async fn delete_rows(&mut self, table: &str, ids: &[String]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if let Some(rows) = inner.tables.get_mut(table) {
            for id in ids {
                rows.remove(id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChangeLogSink for InMemoryTx<'_> {
    async fn append_change_log(
        &mut self,
        block_height: u64,
        _start_index: u32,
        records: &[ChangeRecord],
    ) -> Result<(), StoreError> {
        self.inner.lock().change_log.entry(block_height).or_default().extend(records.iter().cloned());
        Ok(())
    }
}

#[async_trait]
impl ChangeLogSource for InMemoryTx<'_> {
    async fn load_change_log_desc(&mut self, block_height: u64) -> Result<Vec<ChangeRecord>, StoreError> {
        let mut records = self.inner.lock().change_log.get(&block_height).cloned().unwrap_or_default();
        records.reverse();
        Ok(records)
    }
}

#[async_trait]
impl StatusStore for InMemoryTx<'_> {
    async fn load_committed(&mut self) -> Result<Option<(u64, B256)>, StoreError> {
        Ok(self.inner.lock().status)
    }

    async fn commit_status(&mut self, height: u64, hash: B256) -> Result<(), StoreError> {
        self.inner.lock().status = Some((height, hash));
        Ok(())
    }

    async fn insert_hot_block(&mut self, height: u64, hash: B256) -> Result<(), StoreError> {
        self.inner.lock().hot_blocks.insert(height, hash);
        Ok(())
    }

    async fn hot_blocks_desc(&mut self) -> Result<Vec<(u64, B256)>, StoreError> {
        Ok(self.inner.lock().hot_blocks.iter().rev().map(|(h, hash)| (*h, *hash)).collect())
    }

    async fn delete_hot_block(&mut self, height: u64) -> Result<(), StoreError> {
        self.inner.lock().hot_blocks.remove(&height);
        Ok(())
    }

    async fn purge_finalized_below(&mut self, height: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.hot_blocks.retain(|h, _| *h > height);
        inner.change_log.retain(|h, _| *h > height);
        Ok(())
    }
}

impl TransactionalStore for InMemoryStore {
    type Tx<'a> = InMemoryTx<'a>;

    fn begin(&self) -> BoxFuture<'_, Result<InMemoryTx<'_>, StoreError>> {
        Box::pin(async move { Ok(InMemoryTx { inner: &self.inner }) })
    }

    fn commit<'a>(_tx: InMemoryTx<'a>) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async { Ok(()) })
    }
}
