//! Canonical transaction shape.

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::id::format_id;
use crate::request::Sighash;

/// A canonical transaction, belonging to exactly one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub index: u32,
    pub hash: B256,
    pub from: Address,
    pub to: Option<Address>,
    pub input: Bytes,
    pub value: Option<U256>,
    pub gas: Option<U256>,
    pub gas_price: Option<U256>,
    pub nonce: Option<u64>,
    pub v: Option<U256>,
    pub r: Option<U256>,
    pub s: Option<U256>,
    pub chain_id: Option<U256>,
    pub y_parity: Option<bool>,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
}

impl Transaction {
    /// Identity within the pipeline: `formatId(blockHeight, blockHash, index)`.
    pub fn format_id(&self, block_height: u64, block_hash: B256) -> String {
        format_id(block_height, block_hash, Some(self.index))
    }

    /// The 4-byte Keccak-256 function selector, derived from `input`.
    ///
    /// `None` if the input is shorter than 4 bytes (e.g. plain ether
    /// transfers), matching the sighash filter's "match any" semantics for
    /// such transactions.
    pub fn sighash(&self) -> Option<Sighash> {
        self.input.get(0..4).map(Sighash::from_slice)
    }
}
