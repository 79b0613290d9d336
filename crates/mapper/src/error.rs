use alloy::primitives::B256;
use thiserror::Error;

/// Errors while translating a wire block into the canonical model.
///
/// Mapping a single block is all-or-nothing: any failure aborts the whole
/// batch (`# 4.3`), so every variant carries the offending block's identity.
#[derive(Debug, Error)]
pub enum MapperError {
    #[error("block {block_height} ({block_hash}): invalid hex value for `{field}`: {value}")]
    InvalidHex { block_height: u64, block_hash: B256, field: &'static str, value: String },
}
