//! The framework's out-of-the-box persistence logic: projects every
//! delivered block into three generic tables (`blocks`, `transactions`,
//! `logs`), each row a JSON bag keyed by its handler-facing id.
//!
//! Users wiring their own schema are expected to supply their own
//! [`ei_runner::Handler`] instead of this one; it exists so the binary is a
//! runnable reference rather than a library stub.

use std::collections::BTreeMap;

use async_trait::async_trait;
use ei_runner::{Handler, HandlerContext};
use ei_store::{Row, StoreRowOps};
use ei_types::{format_id, BlockItem};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DefaultHandlerError {
    #[error("serializing {kind} row: {source}")]
    Serialize { kind: &'static str, source: serde_json::Error },

    #[error(transparent)]
    Store(#[from] ei_store::StoreError),
}

#[derive(Debug, Default)]
pub struct DefaultHandler;

#[async_trait]
impl Handler for DefaultHandler {
    type Error = DefaultHandlerError;

    async fn handle<S>(&mut self, ctx: HandlerContext<'_, S>) -> Result<(), Self::Error>
    where
        S: StoreRowOps + Send,
    {
        let mut blocks = Vec::with_capacity(ctx.blocks.len());
        let mut transactions = Vec::new();
        let mut logs = Vec::new();

        for block in ctx.blocks {
            blocks.push(to_row("block", &block.header, block.header.format_id())?);

            for item in &block.items {
                match item {
                    BlockItem::Transaction(tx) => {
                        let id = tx.format_id(block.header.height, block.header.hash);
                        transactions.push(to_row("transaction", tx, id)?);
                    }
                    BlockItem::Log { log, tx } => {
                        let id = format_id(block.header.height, block.header.hash, Some(log.index));
                        let mut row = to_row("log", log, id)?;
                        row.insert("tx".to_string(), serde_json::to_value(tx).unwrap());
                        logs.push(row);
                    }
                }
            }
        }

        debug!(
            blocks = blocks.len(),
            transactions = transactions.len(),
            logs = logs.len(),
            is_head = ctx.is_head,
            "persisting batch"
        );

        ctx.store.upsert_rows("blocks", blocks).await?;
        ctx.store.upsert_rows("transactions", transactions).await?;
        ctx.store.upsert_rows("logs", logs).await?;
        Ok(())
    }
}

fn to_row<T: Serialize>(kind: &'static str, value: &T, id: String) -> Result<Row, DefaultHandlerError> {
    let json = serde_json::to_value(value).map_err(|source| DefaultHandlerError::Serialize { kind, source })?;
    // Every canonical type here is a plain struct with named fields, so this
    // always serializes to an object.
    let serde_json::Value::Object(map) = json else { unreachable!("{kind} does not serialize to an object") };
    let mut row: Row = BTreeMap::from_iter(map);
    row.insert("id".to_string(), serde_json::Value::String(id));
    Ok(row)
}
