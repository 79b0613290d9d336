//! Gateway Mapper (C3): translates archive/RPC wire objects into the
//! canonical [`ei_types`] model and enforces per-item ordering.

mod error;
pub mod wire;

use alloy::primitives::U256;

use ei_types::{Block, BlockItem, FieldSelection, FullBlockData, Log, Transaction};

pub use error::MapperError;
use wire::{WireBlockData, WireHeader, WireLog, WireTransaction};

/// Maps a wire block into its canonical [`FullBlockData`] representation.
///
/// `fields` governs whether a log's owning transaction is attached as
/// [`BlockItem::Log::tx`]: only when `fields.log.transaction` is set does
/// the upstream sub-query carry the transaction projection needed to
/// resolve the back-reference (`# 4.1`).
pub fn map_block_data(
    wire: WireBlockData,
    fields: &FieldSelection,
) -> Result<FullBlockData, MapperError> {
    let header = map_header(&wire.header)?;
    let height = header.height;
    let hash = header.hash;

    let transactions: Vec<Transaction> = wire
        .transactions
        .into_iter()
        .map(|tx| map_transaction(tx, height, hash))
        .collect::<Result<_, _>>()?;
    let tx_indices: std::collections::HashSet<u32> = transactions.iter().map(|tx| tx.index).collect();

    let mut items: Vec<BlockItem> = Vec::with_capacity(transactions.len() + wire.logs.len());
    items.extend(transactions.into_iter().map(BlockItem::Transaction));

    for log in wire.logs {
        // `tx` is only populated when the projected transaction actually
        // rode along in this batch — a user who didn't request it never
        // gets a dangling back-reference, even if the flag were set without
        // the upstream query honoring it.
        let tx = if fields.log.transaction && log.transaction_index.is_some_and(|idx| tx_indices.contains(&idx)) {
            log.transaction_index
        } else {
            None
        };
        items.push(BlockItem::Log { log: map_log(log, height, hash)?, tx });
    }

    Ok(FullBlockData::new(header, items))
}

fn map_header(wire: &WireHeader) -> Result<Block, MapperError> {
    let height = wire.number;
    let hash = wire.hash;

    Ok(Block {
        height,
        hash,
        parent_hash: wire.parent_hash,
        timestamp: wire.timestamp,
        nonce: parse_optional_u256(wire.nonce.as_deref(), "nonce", height, hash)?,
        difficulty: parse_optional_u256(wire.difficulty.as_deref(), "difficulty", height, hash)?,
        total_difficulty: parse_optional_u256(
            wire.total_difficulty.as_deref(),
            "totalDifficulty",
            height,
            hash,
        )?,
        size: parse_optional_u256(wire.size.as_deref(), "size", height, hash)?,
        gas_used: parse_optional_u256(wire.gas_used.as_deref(), "gasUsed", height, hash)?,
        gas_limit: parse_optional_u256(wire.gas_limit.as_deref(), "gasLimit", height, hash)?,
        base_fee_per_gas: parse_optional_u256(
            wire.base_fee_per_gas.as_deref(),
            "baseFeePerGas",
            height,
            hash,
        )?,
    })
}

fn map_transaction(
    wire: WireTransaction,
    block_height: u64,
    block_hash: alloy::primitives::B256,
) -> Result<Transaction, MapperError> {
    Ok(Transaction {
        index: wire.index,
        hash: wire.hash,
        from: wire.from,
        to: wire.to,
        input: wire.input,
        value: parse_optional_u256(wire.value.as_deref(), "value", block_height, block_hash)?,
        gas: parse_optional_u256(wire.gas.as_deref(), "gas", block_height, block_hash)?,
        gas_price: parse_optional_u256(
            wire.gas_price.as_deref(),
            "gasPrice",
            block_height,
            block_hash,
        )?,
        nonce: wire.nonce,
        v: parse_optional_u256(wire.v.as_deref(), "v", block_height, block_hash)?,
        r: parse_optional_u256(wire.r.as_deref(), "r", block_height, block_hash)?,
        s: parse_optional_u256(wire.s.as_deref(), "s", block_height, block_hash)?,
        chain_id: parse_optional_u256(
            wire.chain_id.as_deref(),
            "chainId",
            block_height,
            block_hash,
        )?,
        y_parity: wire.y_parity,
        max_fee_per_gas: parse_optional_u256(
            wire.max_fee_per_gas.as_deref(),
            "maxFeePerGas",
            block_height,
            block_hash,
        )?,
        max_priority_fee_per_gas: parse_optional_u256(
            wire.max_priority_fee_per_gas.as_deref(),
            "maxPriorityFeePerGas",
            block_height,
            block_hash,
        )?,
    })
}

fn map_log(
    wire: WireLog,
    block_height: u64,
    block_hash: alloy::primitives::B256,
) -> Result<Log, MapperError> {
    let transaction_index = wire.transaction_index.ok_or(MapperError::InvalidHex {
        block_height,
        block_hash,
        field: "transactionIndex",
        value: "null".to_string(),
    })?;

    Ok(Log {
        index: wire.index,
        address: wire.address,
        topics: wire.topics,
        data: wire.data,
        transaction_index,
        transaction_hash: wire.transaction_hash,
    })
}

fn parse_optional_u256(
    value: Option<&str>,
    field: &'static str,
    block_height: u64,
    block_hash: alloy::primitives::B256,
) -> Result<Option<U256>, MapperError> {
    value
        .map(|raw| {
            raw.parse::<U256>().map_err(|_| MapperError::InvalidHex {
                block_height,
                block_hash,
                field,
                value: raw.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    fn sample_wire() -> WireBlockData {
        WireBlockData {
            header: WireHeader { number: 100, ..Default::default() },
            transactions: vec![],
            logs: vec![],
        }
    }

    #[test]
    fn maps_header_numeric_fields() {
        let mut wire = sample_wire();
        wire.header.gas_used = Some("0x64".to_string());
        let block = map_header(&wire.header).unwrap();
        assert_eq!(block.gas_used, Some(U256::from(100)));
    }

    #[test]
    fn invalid_hex_is_surfaced_with_block_context() {
        let mut wire = sample_wire();
        wire.header.gas_used = Some("not-hex".to_string());
        let err = map_header(&wire.header).unwrap_err();
        match err {
            MapperError::InvalidHex { block_height, field, .. } => {
                assert_eq!(block_height, 100);
                assert_eq!(field, "gasUsed");
            }
        }
    }

    fn sample_wire_transaction(index: u32) -> WireTransaction {
        WireTransaction {
            index,
            hash: Default::default(),
            from: address!("0000000000000000000000000000000000000002"),
            to: None,
            input: Default::default(),
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

    fn sample_wire_log(transaction_index: Option<u32>) -> WireLog {
        WireLog {
            index: 0,
            address: address!("0000000000000000000000000000000000000001"),
            topics: vec![],
            data: Default::default(),
            transaction_index,
            transaction_hash: Default::default(),
        }
    }

    #[test]
    fn log_attaches_transaction_only_when_projection_requested() {
        let log = sample_wire_log(Some(2));
        let tx = sample_wire_transaction(2);

        let mut fields = FieldSelection::default();
        fields.log.transaction = false;
        let block =
            WireBlockData { header: WireHeader { number: 1, ..Default::default() }, transactions: vec![tx.clone()], logs: vec![log.clone()] };
        let mapped = map_block_data(block, &fields).unwrap();
        match mapped.items.iter().find(|item| matches!(item, BlockItem::Log { .. })).unwrap() {
            BlockItem::Log { tx, .. } => assert_eq!(*tx, None),
            _ => unreachable!(),
        }

        fields.log.transaction = true;
        let block = WireBlockData { header: WireHeader { number: 1, ..Default::default() }, transactions: vec![tx], logs: vec![log] };
        let mapped = map_block_data(block, &fields).unwrap();
        match mapped.items.iter().find(|item| matches!(item, BlockItem::Log { .. })).unwrap() {
            BlockItem::Log { tx, .. } => assert_eq!(*tx, Some(2)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn log_tx_reference_stays_absent_when_projected_transaction_never_arrived() {
        // Projection requested, but the upstream batch didn't actually carry
        // transaction index 2 (e.g. it belongs to an earlier sub-query): the
        // log must not end up with a dangling `tx` reference.
        let log = sample_wire_log(Some(2));
        let mut fields = FieldSelection::default();
        fields.log.transaction = true;
        let block = WireBlockData { header: WireHeader { number: 1, ..Default::default() }, transactions: vec![], logs: vec![log] };
        let mapped = map_block_data(block, &fields).unwrap();
        match &mapped.items[0] {
            BlockItem::Log { tx, .. } => assert_eq!(*tx, None),
            _ => panic!("expected a log item"),
        }
    }
}
