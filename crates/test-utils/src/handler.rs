//! A [`ei_runner::Handler`] fixture that just records what it was handed,
//! for asserting on the Runner's delivery order without a real persistence
//! layer underneath.

use std::convert::Infallible;

use async_trait::async_trait;
use ei_runner::{Handler, HandlerContext};
use ei_store::StoreRowOps;

/// One batch as seen by [`RecordingHandler`]: the heights it carried and
/// whether the Runner marked it as reaching the chain tip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBatch {
    pub heights: Vec<u64>,
    pub is_head: bool,
}

#[derive(Debug, Default)]
pub struct RecordingHandler {
    pub batches: Vec<RecordedBatch>,
}

#[async_trait]
impl Handler for RecordingHandler {
    type Error = Infallible;

    async fn handle<S>(&mut self, ctx: HandlerContext<'_, S>) -> Result<(), Self::Error>
    where
        S: StoreRowOps + Send,
    {
        self.batches.push(RecordedBatch {
            heights: ctx.blocks.iter().map(|block| block.header.height).collect(),
            is_head: ctx.is_head,
        });
        Ok(())
    }
}
