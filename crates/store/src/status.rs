//! The processor's durable position: `{schema}.status` and
//! `{schema}.hot_block` (`# 6`).

use alloy::primitives::B256;
use async_trait::async_trait;

use crate::error::StoreError;

/// Reads and advances the processor's committed position, and manages the
/// unfinalized-block bookkeeping the Runner and Rollback Engine need.
#[async_trait]
pub trait StatusStore: Send {
    /// Loads `(height, hash)` of the last committed block, or `None` if
    /// the processor has never committed (`# 4.6`, **INIT**).
    async fn load_committed(&mut self) -> Result<Option<(u64, B256)>, StoreError>;

    /// Atomically advances the committed position to `(height, hash)`.
    async fn commit_status(&mut self, height: u64, hash: B256) -> Result<(), StoreError>;

    /// Records a newly committed unfinalized block.
    async fn insert_hot_block(&mut self, height: u64, hash: B256) -> Result<(), StoreError>;

    /// Lists committed unfinalized blocks, highest height first — the
    /// order the **REORG** state walks in (`# 4.6`).
    async fn hot_blocks_desc(&mut self) -> Result<Vec<(u64, B256)>, StoreError>;

    /// Removes a single unfinalized block's bookkeeping row, the final
    /// step of a per-height rollback (`# 4.8`).
    async fn delete_hot_block(&mut self, height: u64) -> Result<(), StoreError>;

    /// Bulk-purges hot-block and change-log bookkeeping for every height
    /// at or below `height`, once the archive has finalized past it
    /// (`# 3`: "The side log contains no records for finalized heights").
    async fn purge_finalized_below(&mut self, height: u64) -> Result<(), StoreError>;
}
