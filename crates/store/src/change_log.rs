//! The side log's read/write seam (`{schema}.hot_change_log`, `# 6`).

use async_trait::async_trait;
use ei_types::ChangeRecord;

use crate::error::StoreError;

/// Appends change records for one block, in a single bulk insert per
/// Change Tracker operation (`# 4.7`).
#[async_trait]
pub trait ChangeLogSink: Send {
    /// Appends `records` for `block_height`, starting at `start_index`
    /// (the side log's per-block monotonic index, `# 3`).
    async fn append_change_log(
        &mut self,
        block_height: u64,
        start_index: u32,
        records: &[ChangeRecord],
    ) -> Result<(), StoreError>;
}

/// Reads back change records for a block, in reverse application order —
/// the order the Rollback Engine (`# 4.8`) needs to undo them in.
#[async_trait]
pub trait ChangeLogSource: Send {
    /// Loads every change record recorded for `block_height`, sorted by
    /// `index DESC`.
    async fn load_change_log_desc(&mut self, block_height: u64) -> Result<Vec<ChangeRecord>, StoreError>;
}
