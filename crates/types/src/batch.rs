//! The response shape returned by both upstream sources.

use serde::{Deserialize, Serialize};

use crate::{full_block_data::FullBlockData, request::ClosedRange};

/// A batch of canonical blocks covering `range`, as returned by either the
/// archive or the RPC hot source.
///
/// Invariant: `blocks.last().header.height == range.to` always; the mapper
/// backfills a stub header when the upstream returned no data for the
/// trailing block (`# 3`, `# 4.4` step 4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub range: ClosedRange,
    /// Ordered by height ascending.
    pub blocks: Vec<FullBlockData>,
    pub chain_height: u64,
}

impl BatchResponse {
    /// Whether this batch reaches the chain tip (`isHead` in `# 4.6`).
    pub fn is_head(&self) -> bool {
        self.range.to == self.chain_height
    }
}
