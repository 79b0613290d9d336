use std::num::NonZeroU32;

use alloy::eips::BlockNumberOrTag;
use alloy::primitives::B256;
use alloy::providers::Provider;
use governor::{Quota, RateLimiter};
use tracing::instrument;

use ei_mapper::map_block_data;
use ei_types::{Block, FieldSelection, FullBlockData};

use crate::convert;
use crate::error::RpcError;

type Limiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// What a single poll of the chain tip produced.
#[derive(Debug)]
pub enum HotPoll {
    /// No new block since the last poll.
    UpToDate,
    /// One or more new blocks, contiguous and extending the last-seen chain.
    Blocks(Vec<FullBlockData>),
    /// The next block's `parentHash` didn't match the last-seen block's
    /// hash: the chain has reorganized back to (at least) `fork_height`.
    Reorg { fork_height: u64 },
}

/// Follows the chain tip over a live RPC connection (C5).
///
/// `last_seen` tracks `(height, hash)` of the most recently accepted block,
/// the anchor fork detection compares against (`# 4.5`).
pub struct RpcHotSource<P> {
    provider: P,
    limiter: Limiter,
    last_seen: Option<(u64, B256)>,
    max_blocks_per_poll: u64,
}

impl<P> RpcHotSource<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    pub fn new(provider: P, requests_per_second: NonZeroU32, last_seen: Option<(u64, B256)>) -> Self {
        Self {
            provider,
            limiter: RateLimiter::direct(Quota::per_second(requests_per_second)),
            last_seen,
            max_blocks_per_poll: 100,
        }
    }

    /// Resumes following the chain from `height`/`hash` after a rollback
    /// (the Runner calls this once it finds the surviving ancestor).
    pub fn resume_from(&mut self, height: u64, hash: B256) {
        self.last_seen = Some((height, hash));
    }

    /// Fetches the chain's current canonical hash at `height`, used by the
    /// Runner's **REORG** ancestor walk (`# 4.6`) to find where the stored
    /// `hot_block` chain diverged from the live chain.
    #[instrument(skip(self))]
    pub async fn canonical_hash_at(&self, height: u64) -> Result<B256, RpcError> {
        self.limiter.until_ready().await;
        let header = self.fetch_header(height).await?;
        Ok(header.hash)
    }

    #[instrument(skip(self, fields))]
    pub async fn poll(&mut self, fields: &FieldSelection) -> Result<HotPoll, RpcError> {
        self.limiter.until_ready().await;
        let tip = self.provider.get_block_number().await?;

        let Some((last_height, _)) = self.last_seen else {
            let header = self.fetch_header(tip).await?;
            self.last_seen = Some((tip, header.hash));
            return Ok(HotPoll::Blocks(vec![]));
        };

        if tip <= last_height {
            return Ok(HotPoll::UpToDate);
        }

        let end = tip.min(last_height + self.max_blocks_per_poll);
        let mut blocks = Vec::new();

        for height in (last_height + 1)..=end {
            self.limiter.until_ready().await;
            let full = self.fetch_full_block(height, fields).await?;

            if is_fork(self.last_seen, full.header.parent_hash) {
                return Ok(HotPoll::Reorg { fork_height: last_height });
            }

            self.last_seen = Some((full.header.height, full.header.hash));
            blocks.push(full);
        }

        Ok(HotPoll::Blocks(blocks))
    }

    async fn fetch_header(&self, height: u64) -> Result<Block, RpcError> {
        let full = self.fetch_full_block(height, &FieldSelection::default()).await?;
        Ok(full.header)
    }

    async fn fetch_full_block(
        &self,
        height: u64,
        fields: &FieldSelection,
    ) -> Result<FullBlockData, RpcError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(height), true.into())
            .await?
            .ok_or(RpcError::MissingBlock(height))?;

        let receipts = self.provider.get_block_receipts(height.into()).await?.unwrap_or_default();

        let wire = convert::block_data(block, &receipts);
        let block_height = wire.header.number;
        let block_hash = wire.header.hash;
        map_block_data(wire, fields)
            .map_err(|source| RpcError::Mapping { block_height, block_hash, source })
    }
}

/// Whether `new_parent_hash` breaks continuity with the last-seen block
/// (`# 4.5`): no last-seen block means nothing to compare against yet.
fn is_fork(last_seen: Option<(u64, B256)>, new_parent_hash: B256) -> bool {
    matches!(last_seen, Some((_, last_hash)) if last_hash != new_parent_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_last_seen_block_is_never_a_fork() {
        assert!(!is_fork(None, B256::ZERO));
    }

    #[test]
    fn matching_parent_hash_is_not_a_fork() {
        let hash = B256::repeat_byte(1);
        assert!(!is_fork(Some((10, hash)), hash));
    }

    #[test]
    fn mismatched_parent_hash_is_a_fork() {
        let last_hash = B256::repeat_byte(1);
        let new_parent_hash = B256::repeat_byte(2);
        assert!(is_fork(Some((10, last_hash)), new_parent_hash));
    }
}
