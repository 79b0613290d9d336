//! The archive's wire shape: hex-string-encoded JSON as it comes off the
//! `/query` endpoint, before C3 translates it into the canonical model.

use alloy::primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

/// A single block as returned inside the archive's `data` array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBlockData {
    pub header: WireHeader,
    #[serde(default)]
    pub transactions: Vec<WireTransaction>,
    #[serde(default)]
    pub logs: Vec<WireLog>,
}

/// Block header fields, hex-encoded over the wire save for `timestamp`.
///
/// Unknown/unspecified fields are dropped at this layer rather than carried
/// forward: only the attributes the canonical [`ei_types::Block`] models
/// are mapped, per `# 4.3` step 1.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireHeader {
    pub number: u64,
    pub hash: B256,
    pub parent_hash: B256,
    pub timestamp: u64,
    pub nonce: Option<String>,
    pub difficulty: Option<String>,
    pub total_difficulty: Option<String>,
    pub size: Option<String>,
    pub gas_used: Option<String>,
    pub gas_limit: Option<String>,
    pub base_fee_per_gas: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTransaction {
    pub index: u32,
    pub hash: B256,
    pub from: Address,
    pub to: Option<Address>,
    #[serde(default)]
    pub input: Bytes,
    pub value: Option<String>,
    pub gas: Option<String>,
    pub gas_price: Option<String>,
    pub nonce: Option<u64>,
    pub v: Option<String>,
    pub r: Option<String>,
    pub s: Option<String>,
    pub chain_id: Option<String>,
    pub y_parity: Option<bool>,
    pub max_fee_per_gas: Option<String>,
    pub max_priority_fee_per_gas: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLog {
    pub index: u32,
    pub address: Address,
    #[serde(default)]
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
    pub transaction_index: Option<u32>,
    pub transaction_hash: B256,
}
