//! User-declared query shapes: [`DataRequest`] and [`BatchRequest`].

use alloy::primitives::{Address, FixedBytes};
use serde::{Deserialize, Serialize};

use crate::field_selection::FieldSelection;

/// A 4-byte Keccak-256 function selector. Serializes as lowercase 0x-hex,
/// matching the wire normalization required by `# 6`.
pub type Sighash = FixedBytes<4>;

/// A log filter criterion. Empty lists mean "match any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogCriterion {
    pub address: Vec<Address>,
    /// Per-position topic alternatives; an empty inner list means "any value
    /// at this position".
    pub topics: Vec<Vec<alloy::primitives::B256>>,
}

/// A transaction filter criterion. Empty lists mean "match any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxCriterion {
    pub to: Vec<Address>,
    pub from: Vec<Address>,
    /// 4-byte function selectors, normalized to lowercase hex before
    /// dispatch (see `# 6`).
    pub sighash: Vec<Sighash>,
}

/// A half-open-or-closed height range. `to: None` means "track the tip".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightRange {
    pub from: u64,
    pub to: Option<u64>,
}

impl HeightRange {
    /// Whether this range contains no heights at all (scenario S1).
    pub fn is_empty(&self) -> bool {
        matches!(self.to, Some(to) if to < self.from)
    }
}

/// A closed height range with a concrete upper bound, as returned by an
/// upstream source once it has decided the batch's actual extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedRange {
    pub from: u64,
    pub to: u64,
}

/// A user-declared filter + projection over a block range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRequest {
    pub include_all_blocks: bool,
    pub logs: Vec<LogCriterion>,
    pub transactions: Vec<TxCriterion>,
    pub fields: Option<FieldSelection>,
}

/// A [`DataRequest`] bounded to a height range, the unit the Runner
/// dispatches to upstream sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub range: HeightRange,
    pub request: DataRequest,
}
