//! Canonical log shape.

use alloy::primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

/// A canonical EVM log, belonging to exactly one transaction in one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub index: u32,
    pub address: Address,
    /// Ordered sequence of up to 4 indexed topics.
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub transaction_index: u32,
    pub transaction_hash: B256,
}
