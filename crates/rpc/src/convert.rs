//! Translates `alloy` RPC types into the mapper's wire shape, so the hot
//! RPC path and the archive HTTP path share the same C3 translation logic.

use alloy::rpc::types::{Block as RpcBlock, Log as RpcLog, Transaction as RpcTransaction, TransactionReceipt};
use ei_mapper::wire::{WireBlockData, WireHeader, WireLog, WireTransaction};

fn hex(value: impl std::fmt::LowerHex) -> String {
    format!("0x{value:x}")
}

pub fn block_header(block: &RpcBlock<RpcTransaction>) -> WireHeader {
    let header = &block.header;
    WireHeader {
        number: header.number,
        hash: header.hash,
        parent_hash: header.parent_hash,
        timestamp: header.timestamp,
        nonce: Some(hex(header.nonce.into())),
        difficulty: Some(hex(header.difficulty)),
        total_difficulty: block.total_difficulty.map(hex),
        size: block.size.map(hex),
        gas_used: Some(hex(header.gas_used)),
        gas_limit: Some(hex(header.gas_limit)),
        base_fee_per_gas: header.base_fee_per_gas.map(hex),
    }
}

pub fn transaction(tx: &RpcTransaction) -> WireTransaction {
    WireTransaction {
        index: tx.transaction_index.unwrap_or_default() as u32,
        hash: *tx.inner.tx_hash(),
        from: tx.from,
        to: tx.to(),
        input: tx.input().clone(),
        value: Some(hex(tx.value())),
        gas: Some(hex(tx.gas_limit())),
        gas_price: tx.gas_price().map(hex),
        nonce: Some(tx.nonce()),
        v: None,
        r: None,
        s: None,
        chain_id: tx.chain_id().map(hex),
        y_parity: None,
        max_fee_per_gas: Some(hex(tx.max_fee_per_gas())),
        max_priority_fee_per_gas: tx.max_priority_fee_per_gas().map(hex),
    }
}

pub fn logs_from_receipts(receipts: &[TransactionReceipt]) -> Vec<WireLog> {
    receipts
        .iter()
        .flat_map(|receipt| receipt.inner.logs().iter())
        .map(log)
        .collect()
}

fn log(log: &RpcLog) -> WireLog {
    WireLog {
        index: log.log_index.unwrap_or_default() as u32,
        address: log.address(),
        topics: log.topics().to_vec(),
        data: log.data().data.clone(),
        transaction_index: log.transaction_index.map(|i| i as u32),
        transaction_hash: log.transaction_hash.unwrap_or_default(),
    }
}

pub fn block_data(
    block: RpcBlock<RpcTransaction>,
    receipts: &[TransactionReceipt],
) -> WireBlockData {
    let header = block_header(&block);
    let transactions = block.transactions.txns().map(transaction).collect();
    let logs = logs_from_receipts(receipts);
    WireBlockData { header, transactions, logs }
}
