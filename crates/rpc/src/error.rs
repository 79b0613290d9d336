use alloy::primitives::B256;
use ei_mapper::MapperError;
use thiserror::Error;

/// Errors surfaced by [`crate::RpcHotSource`].
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("rpc call failed: {0}")]
    Transport(#[from] alloy::transports::TransportError),

    #[error("rpc returned no block at height {0}")]
    MissingBlock(u64),

    #[error("mapping block {block_height} ({block_hash}): {source}")]
    Mapping { block_height: u64, block_hash: B256, #[source] source: MapperError },
}
