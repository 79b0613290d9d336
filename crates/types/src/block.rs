//! Canonical block header shape.

use alloy::primitives::{B256, U256};
use serde::{Deserialize, Serialize};

use crate::id::format_id;

/// A canonical block header, as delivered to the handler.
///
/// Optional header fields follow the wire's hex-or-absent convention:
/// `None` means the upstream did not project the field (see
/// [`crate::FieldSelection`]), not that the chain lacks the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    pub hash: B256,
    pub parent_hash: B256,
    pub timestamp: u64,
    pub nonce: Option<U256>,
    pub difficulty: Option<U256>,
    pub total_difficulty: Option<U256>,
    pub size: Option<U256>,
    pub gas_used: Option<U256>,
    pub gas_limit: Option<U256>,
    pub base_fee_per_gas: Option<U256>,
}

impl Block {
    /// Identity is `(height, hash)`.
    pub fn identity(&self) -> (u64, B256) {
        (self.height, self.hash)
    }

    /// Stable handler-facing id for this block.
    pub fn format_id(&self) -> String {
        format_id(self.height, self.hash, None)
    }

    /// Builds a stub header for a backfilled trailing block: every optional
    /// field absent, used when the upstream returned no data for the range's
    /// closing height (see `# 4.4` step 4 and scenario S2).
    pub fn stub(height: u64, hash: B256, parent_hash: B256, timestamp: u64) -> Self {
        Self {
            height,
            hash,
            parent_hash,
            timestamp,
            nonce: None,
            difficulty: None,
            total_difficulty: None,
            size: None,
            gas_used: None,
            gas_limit: None,
            base_fee_per_gas: None,
        }
    }
}
