//! A canned stand-in for the archive's bulk finalized-data endpoint (C4),
//! driven by a fixed set of pre-built blocks rather than a live HTTP server.

use alloy::primitives::B256;
use async_trait::async_trait;
use ei_runner::{ArchiveSource, RunnerError};
use ei_types::{BatchRequest, BatchResponse, Block, ClosedRange, FullBlockData};

/// Serves `get_finalized_batch` out of an in-memory, height-sorted block
/// list, clamping every response to `chain_height` the way a real archive
/// clamps to its own observed tip.
pub struct FakeArchiveSource {
    blocks: Vec<FullBlockData>,
    chain_height: u64,
}

impl FakeArchiveSource {
    pub fn new(mut blocks: Vec<FullBlockData>, chain_height: u64) -> Self {
        blocks.sort_by_key(|block| block.header.height);
        Self { blocks, chain_height }
    }
}

#[async_trait]
impl ArchiveSource for FakeArchiveSource {
    async fn get_finalized_height(&self) -> Result<u64, RunnerError> {
        Ok(self.chain_height)
    }

    async fn get_finalized_batch(&self, req: &BatchRequest) -> Result<BatchResponse, RunnerError> {
        let upper = req.range.to.map_or(self.chain_height, |to| to.min(self.chain_height));
        let mut blocks: Vec<FullBlockData> = self
            .blocks
            .iter()
            .filter(|block| block.header.height >= req.range.from && block.header.height <= upper)
            .cloned()
            .collect();

        // Mirror the real archive's trailing-stub backfill (`# 4.4` step 4)
        // when the fixture's seeded blocks don't reach `upper`.
        if blocks.last().map(|block| block.header.height) != Some(upper) {
            blocks.push(FullBlockData::new(Block::stub(upper, B256::ZERO, B256::ZERO, 0), vec![]));
        }

        Ok(BatchResponse { range: ClosedRange { from: req.range.from, to: upper }, blocks, chain_height: self.chain_height })
    }
}
