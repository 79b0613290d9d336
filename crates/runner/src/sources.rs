use alloy::primitives::B256;
use async_trait::async_trait;
use ei_archive::ArchiveClient;
use ei_rpc::{HotPoll, RpcHotSource};
use ei_types::{BatchRequest, BatchResponse, FieldSelection};

use crate::error::RunnerError;

/// The Runner's view of C4: a finalized-range batch source.
///
/// A thin seam over [`ei_archive::ArchiveClient`] so the Runner can be
/// exercised against fakes in `ei-test-utils` without a live archive.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    async fn get_finalized_height(&self) -> Result<u64, RunnerError>;
    async fn get_finalized_batch(&self, req: &BatchRequest) -> Result<BatchResponse, RunnerError>;
}

#[async_trait]
impl ArchiveSource for ArchiveClient {
    async fn get_finalized_height(&self) -> Result<u64, RunnerError> {
        Ok(ArchiveClient::get_finalized_height(self).await?)
    }

    async fn get_finalized_batch(&self, req: &BatchRequest) -> Result<BatchResponse, RunnerError> {
        Ok(ArchiveClient::get_finalized_batch(self, req).await?)
    }
}

/// The Runner's view of C5: a chain-tip follower.
#[async_trait]
pub trait HotSource: Send {
    async fn poll(&mut self, fields: &FieldSelection) -> Result<HotPoll, RunnerError>;
    fn resume_from(&mut self, height: u64, hash: B256);
    async fn canonical_hash_at(&self, height: u64) -> Result<B256, RunnerError>;
}

#[async_trait]
impl<P> HotSource for RpcHotSource<P>
where
    P: alloy::providers::Provider + Clone + Send + Sync + 'static,
{
    async fn poll(&mut self, fields: &FieldSelection) -> Result<HotPoll, RunnerError> {
        Ok(RpcHotSource::poll(self, fields).await?)
    }

    fn resume_from(&mut self, height: u64, hash: B256) {
        RpcHotSource::resume_from(self, height, hash)
    }

    async fn canonical_hash_at(&self, height: u64) -> Result<B256, RunnerError> {
        Ok(RpcHotSource::canonical_hash_at(self, height).await?)
    }
}
