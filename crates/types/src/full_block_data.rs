//! A single block's header plus its ordered items.

use serde::{Deserialize, Serialize};

use crate::{
    block::Block,
    block_item::{sort_items, BlockItem},
    transaction::Transaction,
};

/// A block's header together with its ordered item list.
///
/// Invariant: `items` are sorted by `blockItemOrder` (see
/// [`crate::block_item::block_item_order`]). Log items without a matching
/// transaction in the batch remain present but with `tx` absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullBlockData {
    pub header: Block,
    pub items: Vec<BlockItem>,
}

impl FullBlockData {
    /// Builds a new instance, sorting `items` per `blockItemOrder`.
    pub fn new(header: Block, mut items: Vec<BlockItem>) -> Self {
        sort_items(&mut items);
        Self { header, items }
    }

    /// Resolves a log item's `tx` back-reference to the actual transaction,
    /// scanning this block's own items (never a pointer/`Rc`, per the
    /// design note on avoiding cyclic ownership).
    pub fn transaction(&self, index: u32) -> Option<&Transaction> {
        self.items.iter().find_map(|item| match item {
            BlockItem::Transaction(tx) if tx.index == index => Some(tx),
            _ => None,
        })
    }

    /// All transaction items, in item order.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.items.iter().filter_map(|item| match item {
            BlockItem::Transaction(tx) => Some(tx),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, Bytes, B256};
    use crate::log::Log;

    fn sample_tx(index: u32) -> Transaction {
        Transaction {
            index,
            hash: B256::ZERO,
            from: Address::ZERO,
            to: None,
            input: Bytes::new(),
            value: None,
            gas: None,
            gas_price: None,
            nonce: None,
            v: None,
            r: None,
            s: None,
            chain_id: None,
            y_parity: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
        }
    }

    fn sample_header() -> Block {
        Block::stub(1, B256::repeat_byte(1), B256::ZERO, 0)
    }

    #[test]
    fn transaction_lookup_resolves_by_index() {
        let data = FullBlockData::new(sample_header(), vec![BlockItem::Transaction(sample_tx(2))]);
        assert!(data.transaction(2).is_some());
        assert!(data.transaction(3).is_none());
    }

    #[test]
    fn log_without_matching_tx_keeps_tx_absent() {
        let log = Log {
            index: 0,
            address: Address::ZERO,
            topics: vec![],
            data: Bytes::new(),
            transaction_index: 5,
            transaction_hash: B256::ZERO,
        };
        let data = FullBlockData::new(sample_header(), vec![BlockItem::Log { log, tx: None }]);
        assert!(matches!(&data.items[0], BlockItem::Log { tx: None, .. }));
    }
}
