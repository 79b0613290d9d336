//! The per-block item union and its canonical ordering.

use serde::{Deserialize, Serialize};

use crate::{log::Log, transaction::Transaction};

/// A single item within a block's ordered item list.
///
/// The `tx` back-reference on a log item is an index into the batch's
/// transaction array, not a pointer, per the design note on avoiding
/// cyclic ownership (`# 9`, "Ownership of transactions in items"). It is
/// populated only when the log's `transactionIndex` matches a transaction
/// also included in this block's batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockItem {
    Transaction(Transaction),
    Log {
        log: Log,
        /// The owning transaction's `index`, resolved against the block's
        /// transaction items via [`crate::FullBlockData::transaction`].
        /// Absent when the user did not request that transaction.
        tx: Option<u32>,
    },
}

impl BlockItem {
    /// The item's `transactionIndex`, used as the primary sort key. Absent
    /// for items with no owning transaction index.
    fn transaction_index(&self) -> Option<u32> {
        match self {
            BlockItem::Transaction(tx) => Some(tx.index),
            BlockItem::Log { log, .. } => Some(log.transaction_index),
        }
    }

    /// Secondary sort key: transactions sort before logs at the same
    /// `transactionIndex`.
    fn kind_priority(&self) -> u8 {
        match self {
            BlockItem::Transaction(_) => 0,
            BlockItem::Log { .. } => 1,
        }
    }

    /// Tertiary sort key: a log's own `index`, ascending. Transactions have
    /// no log index and sort before any log at the same priority tier.
    fn log_index(&self) -> Option<u32> {
        match self {
            BlockItem::Transaction(_) => None,
            BlockItem::Log { log, .. } => Some(log.index),
        }
    }
}

/// Sort key implementing `blockItemOrder`:
/// `(transactionIndex ascending, kind priority, logIndex ascending)`, with
/// absent `transactionIndex` treated as -infinity.
pub fn block_item_order(item: &BlockItem) -> (i64, u8, u32) {
    let tx_index = item.transaction_index().map(i64::from).unwrap_or(i64::MIN);
    (tx_index, item.kind_priority(), item.log_index().unwrap_or(0))
}

/// Sorts `items` in place according to [`block_item_order`].
pub fn sort_items(items: &mut [BlockItem]) {
    items.sort_by_key(block_item_order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{log::Log, transaction::Transaction};
    use alloy::primitives::{Address, Bytes, B256};

    fn tx(index: u32) -> Transaction {
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

    fn log(transaction_index: u32, index: u32) -> Log {
        Log {
            index,
            address: Address::ZERO,
            topics: vec![],
            data: Bytes::new(),
            transaction_index,
            transaction_hash: B256::ZERO,
        }
    }

    #[test]
    fn transaction_sorts_before_its_logs() {
        let mut items = vec![
            BlockItem::Log { log: log(1, 0), tx: Some(0) },
            BlockItem::Transaction(tx(1)),
        ];
        sort_items(&mut items);
        assert!(matches!(items[0], BlockItem::Transaction(_)));
        assert!(matches!(items[1], BlockItem::Log { .. }));
    }

    #[test]
    fn logs_order_by_log_index_within_same_transaction() {
        let mut items = vec![
            BlockItem::Log { log: log(0, 2), tx: None },
            BlockItem::Log { log: log(0, 1), tx: None },
        ];
        sort_items(&mut items);
        let BlockItem::Log { log, .. } = &items[0] else { unreachable!() };
        assert_eq!(log.index, 1);
    }

    #[test]
    fn absent_transaction_index_sorts_first() {
        let mut items = vec![BlockItem::Transaction(tx(0)), BlockItem::Transaction(tx(1))];
        sort_items(&mut items);
        assert_eq!(items[0], BlockItem::Transaction(tx(0)));
    }
}
