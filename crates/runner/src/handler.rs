use async_trait::async_trait;
use ei_store::StoreRowOps;
use ei_types::FullBlockData;
use tracing::Span;

/// The user-supplied context for one batch (`# 4.6`):
/// `{blocks, isHead, store, log}`.
pub struct HandlerContext<'a, S> {
    pub blocks: &'a [FullBlockData],
    pub is_head: bool,
    pub store: &'a mut S,
    /// A tracing span scoped to this batch, for target-scoped logging from
    /// within handler code.
    pub log: &'a Span,
}

/// User-supplied persistence logic, invoked once per batch inside a store
/// transaction.
///
/// Generic over the store type of the call so the same handler runs
/// unmodified whether `S` is a plain row-ops store (ARCHIVE batches) or a
/// [`ei_store::ChangeTracker`]-wrapped one (HOT batches) — the handler
/// never needs to know which phase produced its batch.
#[async_trait]
pub trait Handler: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn handle<S>(&mut self, ctx: HandlerContext<'_, S>) -> Result<(), Self::Error>
    where
        S: StoreRowOps + Send;
}
