//! The archive's `/query` and `/height` wire shapes.

use ei_types::{LogCriterion, TxCriterion};
use ei_mapper::wire::WireBlockData;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest<'a> {
    pub from_block: u64,
    pub to_block: Option<u64>,
    pub include_all_blocks: bool,
    pub transactions: &'a [TxCriterion],
    pub logs: &'a [LogCriterion],
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    /// One inner list of blocks per requested height; heights with no
    /// matching data surface as an empty inner list.
    pub data: Vec<Vec<WireBlockData>>,
    pub next_block: u64,
    pub archive_height: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeightResponse {
    pub height: u64,
}
