//! Stable, handler-facing identifiers.

use alloy::primitives::B256;

/// Number of leading hash hex digits folded into [`format_id`].
///
/// Four bytes (8 hex digits) is enough to make collisions between blocks at
/// the same height practically impossible while keeping ids short.
const HASH_PREFIX_HEX_LEN: usize = 8;

/// Builds the stable primary-key string the handler sees for a block,
/// transaction, or log item.
///
/// The id is a zero-padded height joined with a prefix of the block hash,
/// and optionally a zero-padded item index: `{height:010}-{hash_prefix}` or
/// `{height:010}-{hash_prefix}-{index:06}`.
pub fn format_id(height: u64, hash: B256, index: Option<u32>) -> String {
    let hex = hex::encode(hash.as_slice());
    let prefix = &hex[..HASH_PREFIX_HEX_LEN.min(hex.len())];
    match index {
        Some(idx) => format!("{height:010}-{prefix}-{idx:06}"),
        None => format!("{height:010}-{prefix}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_id_has_no_index_segment() {
        let id = format_id(42, B256::repeat_byte(0xab), None);
        assert_eq!(id, "0000000042-abababab");
    }

    #[test]
    fn tx_id_appends_zero_padded_index() {
        let id = format_id(42, B256::repeat_byte(0xab), Some(7));
        assert_eq!(id, "0000000042-abababab-000007");
    }

    #[test]
    fn ids_are_stable_across_calls() {
        let hash = B256::repeat_byte(0x11);
        assert_eq!(format_id(1, hash, Some(2)), format_id(1, hash, Some(2)));
    }
}
