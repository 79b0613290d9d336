//! The Runner (C6): drives the ARCHIVE/HOT/REORG state machine (`# 4.6`),
//! turning a [`ei_types::DataRequest`] plus height range into a sequence of
//! handler invocations against the store.

use std::time::{Duration, Instant};

use alloy::primitives::B256;
use ei_store::{ChangeTracker, RollbackEngine, StatusStore, TransactionalStore};
use ei_types::{BatchRequest, DataRequest, FieldSelection, FullBlockData, HeightRange};
use tracing::{info, info_span, instrument, warn};

use crate::error::RunnerError;
use crate::handler::{Handler, HandlerContext};
use crate::sources::{ArchiveSource, HotSource};
use crate::state::{ExitReason, RunnerState};

/// How long [`Runner::run`] sleeps between HOT polls that found nothing new.
const HOT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Drives one [`ei_types::DataRequest`] end to end against a store,
/// switching between the archive and RPC hot sources as it catches up to
/// the chain tip, and reconciling hot blocks against the live chain when a
/// fork is detected.
///
/// Generic over the store (`T`, opened once per batch) and the handler
/// (`H`, user persistence logic); the archive and hot sources are boxed
/// trait objects since either may be entirely absent (`# 4.1`: at least one
/// of the two must be configured, but never both are required).
pub struct Runner<T, H> {
    fields: FieldSelection,
    request: DataRequest,
    global_range: Option<HeightRange>,
    safety_depth: u64,
    archive: Option<Box<dyn ArchiveSource>>,
    hot: Option<Box<dyn HotSource>>,
    store: T,
    handler: H,
    state: RunnerState,
    last_committed: Option<(u64, B256)>,
}

impl<T, H> Runner<T, H>
where
    T: TransactionalStore,
    H: Handler,
{
    /// Builds a new Runner. `safety_depth` is the number of blocks the
    /// Runner keeps trailing the archive's reported chain height before
    /// switching from ARCHIVE to HOT (`# 4.6`); `global_range.to` is the
    /// configured `blockRange` upper bound, if any.
    pub fn new(
        fields: FieldSelection,
        request: DataRequest,
        global_range: Option<HeightRange>,
        safety_depth: u64,
        archive: Option<Box<dyn ArchiveSource>>,
        hot: Option<Box<dyn HotSource>>,
        store: T,
        handler: H,
    ) -> Result<Self, RunnerError> {
        if archive.is_none() && hot.is_none() {
            return Err(RunnerError::NoDataSource);
        }
        Ok(Self {
            fields,
            request,
            global_range,
            safety_depth,
            archive,
            hot,
            store,
            handler,
            state: RunnerState::Init,
            last_committed: None,
        })
    }

    /// Runs until a terminal condition is reached: the configured range is
    /// exhausted (`RangeComplete`), was empty to begin with (`EmptyRange`,
    /// scenario S1), or the caller observes [`ExitReason::Cancelled`] and
    /// stops calling `run` again between batches (`# 5`).
    pub async fn run(&mut self) -> Result<ExitReason, RunnerError> {
        let (_tx, never) = tokio::sync::watch::channel(false);
        self.run_cancellable(never).await
    }

    /// Runs until a terminal condition is reached, also observing `shutdown`
    /// between batches: once it reads `true`, the Runner stops at its next
    /// suspension point and returns [`ExitReason::Cancelled`] rather than
    /// starting another batch, letting any in-flight batch finish cleanly
    /// first (`# 5`).
    pub async fn run_cancellable(
        &mut self,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> Result<ExitReason, RunnerError> {
        if matches!(self.global_range, Some(range) if range.is_empty()) {
            return Ok(ExitReason::EmptyRange);
        }

        loop {
            if *shutdown.borrow() {
                info!("shutdown observed, stopping at the next suspension point");
                return Ok(ExitReason::Cancelled);
            }

            let exit = match self.state.clone() {
                RunnerState::Init => {
                    self.init().await?;
                    None
                }
                RunnerState::Archive => self.step_archive().await?,
                RunnerState::Hot => self.step_hot().await?,
                RunnerState::Reorg { fork_height } => {
                    self.handle_reorg(fork_height).await?;
                    None
                }
            };
            if let Some(reason) = exit {
                return Ok(reason);
            }
        }
    }

    #[instrument(skip(self))]
    async fn init(&mut self) -> Result<(), RunnerError> {
        let last = {
            let mut tx = self.store.begin().await?;
            let last = tx.load_committed().await?;
            T::commit(tx).await?;
            last
        };
        self.last_committed = last;
        info!(?last, "loaded committed position");

        self.state = match &self.archive {
            // Archive-only configuration: always start (and stay) in
            // ARCHIVE, letting `step_archive` decide termination once it
            // catches up to the tip rather than switching to a HOT state
            // with nothing configured to poll.
            Some(_) if self.hot.is_none() => RunnerState::Archive,
            Some(archive) => {
                let archive_height = archive.get_finalized_height().await?;
                let start = self.next_height();
                if archive_height.saturating_sub(start) > self.safety_depth {
                    RunnerState::Archive
                } else {
                    RunnerState::Hot
                }
            }
            None => RunnerState::Hot,
        };
        Ok(())
    }

    /// The next height to request: one past the last committed block, or
    /// the configured range's lower bound if nothing has been committed
    /// yet (`# 4.6`, **INIT**).
    fn next_height(&self) -> u64 {
        self.last_committed
            .map(|(height, _)| height + 1)
            .unwrap_or_else(|| self.global_range.map(|range| range.from).unwrap_or(0))
    }

    fn range_exhausted(&self, committed_to: u64) -> bool {
        matches!(self.global_range, Some(range) if matches!(range.to, Some(to) if committed_to >= to))
    }

    #[instrument(skip(self))]
    async fn step_archive(&mut self) -> Result<Option<ExitReason>, RunnerError> {
        let Some(archive) = self.archive.as_deref() else {
            self.state = RunnerState::Hot;
            return Ok(None);
        };

        let start = self.next_height();
        if self.range_exhausted(start.saturating_sub(1)) {
            return Ok(Some(ExitReason::RangeComplete));
        }

        let request = BatchRequest {
            range: HeightRange { from: start, to: self.global_range.and_then(|range| range.to) },
            request: self.request_with_fields(),
        };

        let fetch_started = Instant::now();
        let batch = archive.get_finalized_batch(&request).await?;
        ei_metrics::record_upstream_latency("archive", fetch_started.elapsed());

        verify_batch_monotonic(start, &batch.blocks)?;

        let apply_started = Instant::now();
        let mut tx = self.store.begin().await?;
        let span = info_span!("archive_batch", from = batch.range.from, to = batch.range.to);
        self.handler
            .handle(HandlerContext { blocks: &batch.blocks, is_head: batch.is_head(), store: &mut tx, log: &span })
            .await
            .map_err(|source| RunnerError::Handler {
                from: batch.range.from,
                to: batch.range.to,
                source: Box::new(source),
            })?;

        if let Some(last) = batch.blocks.last() {
            tx.commit_status(last.header.height, last.header.hash).await?;
            self.last_committed = Some((last.header.height, last.header.hash));
        }
        T::commit(tx).await?;
        ei_metrics::record_batch(ei_metrics::Phase::Archive, batch.blocks.len() as u64, apply_started.elapsed());
        if let Some((height, _)) = self.last_committed {
            ei_metrics::set_committed_height(height);
        }

        let caught_up = batch.chain_height.saturating_sub(batch.range.to) <= self.safety_depth;
        if caught_up && self.hot.is_some() {
            info!(height = batch.range.to, "caught up to the archive's trailing edge, switching to hot polling");
            self.state = RunnerState::Hot;
        }

        if self.range_exhausted(batch.range.to) {
            return Ok(Some(ExitReason::RangeComplete));
        }
        // Archive-only configuration (no hot source) with no configured
        // upper bound: there is nothing further to backfill once caught up.
        if caught_up && self.hot.is_none() {
            return Ok(Some(ExitReason::RangeComplete));
        }
        Ok(None)
    }

    #[instrument(skip(self))]
    async fn step_hot(&mut self) -> Result<Option<ExitReason>, RunnerError> {
        // Entering HOT (including resuming after a resolved reorg) can land
        // exactly on a configured upper bound with nothing left to poll for.
        if self.range_exhausted(self.next_height().saturating_sub(1)) {
            return Ok(Some(ExitReason::RangeComplete));
        }

        let poll = {
            let Some(hot) = self.hot.as_deref_mut() else {
                return Err(RunnerError::NoDataSource);
            };
            hot.poll(&self.fields).await?
        };

        let blocks = match poll {
            ei_rpc::HotPoll::UpToDate => {
                tokio::time::sleep(HOT_POLL_INTERVAL).await;
                return Ok(None);
            }
            ei_rpc::HotPoll::Reorg { fork_height } => {
                warn!(fork_height, "hot source reported a reorg");
                self.state = RunnerState::Reorg { fork_height };
                return Ok(None);
            }
            ei_rpc::HotPoll::Blocks(blocks) => blocks,
        };

        for block in blocks {
            if self.range_exhausted(block.header.height.saturating_sub(1)) {
                return Ok(Some(ExitReason::RangeComplete));
            }

            let apply_started = Instant::now();
            let mut tx = self.store.begin().await?;
            let span = info_span!("hot_block", height = block.header.height);
            {
                let mut tracker = ChangeTracker::new(&mut tx, block.header.height);
                let blocks = std::slice::from_ref(&block);
                self.handler
                    .handle(HandlerContext { blocks, is_head: true, store: &mut tracker, log: &span })
                    .await
                    .map_err(|source| RunnerError::Handler {
                        from: block.header.height,
                        to: block.header.height,
                        source: Box::new(source),
                    })?;
            }
            tx.insert_hot_block(block.header.height, block.header.hash).await?;
            tx.commit_status(block.header.height, block.header.hash).await?;
            T::commit(tx).await?;

            self.last_committed = Some((block.header.height, block.header.hash));
            ei_metrics::record_batch(ei_metrics::Phase::Hot, 1, apply_started.elapsed());
            ei_metrics::set_committed_height(block.header.height);

            if self.range_exhausted(block.header.height) {
                return Ok(Some(ExitReason::RangeComplete));
            }
        }
        Ok(None)
    }

    /// Walks stored hot blocks downward from `fork_height`, comparing each
    /// against the live chain's canonical hash, rolling back every height
    /// that no longer matches, then resumes hot polling from the surviving
    /// ancestor (`# 4.6`, **REORG**).
    #[instrument(skip(self))]
    async fn handle_reorg(&mut self, fork_height: u64) -> Result<(), RunnerError> {
        let Some(hot) = self.hot.as_deref() else {
            return Err(RunnerError::NoDataSource);
        };

        let mut tx = self.store.begin().await?;
        let stored = tx.hot_blocks_desc().await?;

        let mut height = fork_height;
        let mut undone = 0u64;
        let ancestor = loop {
            let canonical = hot.canonical_hash_at(height).await?;
            match stored.iter().find(|(h, _)| *h == height) {
                Some((_, stored_hash)) if *stored_hash == canonical => break (height, canonical),
                Some(_) => {
                    RollbackEngine::rollback_block(&mut tx, height).await?;
                    undone += 1;
                    if height == 0 {
                        return Err(RunnerError::Invariant(
                            "reorg rollback reached genesis without finding a surviving ancestor".into(),
                        ));
                    }
                    height -= 1;
                }
                // Below the tracked hot window: treat the live chain's hash
                // at this height as already-finalized and therefore as good
                // an ancestor as any (`# 4.8`).
                None => break (height, canonical),
            }
        };
        tx.commit_status(ancestor.0, ancestor.1).await?;
        T::commit(tx).await?;

        ei_metrics::record_reorg_depth(undone);
        warn!(ancestor_height = ancestor.0, undone, "reorg resolved, resuming from surviving ancestor");

        self.last_committed = Some(ancestor);
        if let Some(hot) = self.hot.as_deref_mut() {
            hot.resume_from(ancestor.0, ancestor.1);
        }
        self.state = RunnerState::Hot;
        Ok(())
    }

    fn request_with_fields(&self) -> DataRequest {
        let mut request = self.request.clone();
        request.fields = Some(self.fields.clone());
        request
    }
}

/// Confirms a freshly fetched batch picks up exactly where the Runner left
/// off and stays height-ascending throughout, the monotonic-delivery
/// invariant (`# 3`) the Runner itself must never violate regardless of
/// what the upstream returned.
fn verify_batch_monotonic(expected_start: u64, blocks: &[FullBlockData]) -> Result<(), RunnerError> {
    let mut previous = None;
    for block in blocks {
        let height = block.header.height;
        if let Some(previous) = previous {
            if height <= previous {
                return Err(RunnerError::Invariant(format!(
                    "batch heights out of order: {height} did not follow {previous}"
                )));
            }
        } else if height != expected_start {
            return Err(RunnerError::Invariant(format!(
                "batch started at {height}, expected {expected_start}"
            )));
        }
        previous = Some(height);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ei_types::Block;

    fn block_at(height: u64) -> FullBlockData {
        FullBlockData::new(Block::stub(height, B256::repeat_byte(height as u8), B256::ZERO, 0), vec![])
    }

    #[test]
    fn monotonic_batch_starting_at_expected_height_is_accepted() {
        let blocks = vec![block_at(10), block_at(11), block_at(12)];
        assert!(verify_batch_monotonic(10, &blocks).is_ok());
    }

    #[test]
    fn batch_starting_at_the_wrong_height_is_rejected() {
        let blocks = vec![block_at(11)];
        assert!(verify_batch_monotonic(10, &blocks).is_err());
    }

    #[test]
    fn non_increasing_heights_within_a_batch_are_rejected() {
        let blocks = vec![block_at(10), block_at(10)];
        assert!(verify_batch_monotonic(10, &blocks).is_err());
    }

    #[test]
    fn empty_batch_is_trivially_monotonic() {
        assert!(verify_batch_monotonic(10, &[]).is_ok());
    }
}

#[cfg(test)]
mod integration_tests {
    use std::collections::HashMap;

    use ei_rpc::HotPoll;
    use ei_test_utils::{FakeArchiveSource, FakeHotSource, InMemoryStore, RecordingHandler};
    use ei_types::{Block, DataRequest, FieldSelection, FullBlockData, HeightRange};

    use super::*;

    fn block_at(height: u64, hash: B256, parent_hash: B256) -> FullBlockData {
        FullBlockData::new(Block::stub(height, hash, parent_hash, 0), vec![])
    }

    fn hash(byte: u8) -> B256 {
        B256::repeat_byte(byte)
    }

    fn new_runner(
        global_range: Option<HeightRange>,
        safety_depth: u64,
        archive: Option<FakeArchiveSource>,
        hot: Option<FakeHotSource>,
        store: InMemoryStore,
    ) -> Runner<InMemoryStore, RecordingHandler> {
        Runner::new(
            FieldSelection::default(),
            DataRequest::default(),
            global_range,
            safety_depth,
            archive.map(|a| Box::new(a) as Box<dyn ArchiveSource>),
            hot.map(|h| Box::new(h) as Box<dyn HotSource>),
            store,
            RecordingHandler::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn archive_only_backfill_completes_without_a_hot_source() {
        let blocks = (0..=10).map(|h| block_at(h, hash(h as u8), hash(h.saturating_sub(1) as u8))).collect();
        let archive = FakeArchiveSource::new(blocks, 10);
        let mut runner = new_runner(
            Some(HeightRange { from: 0, to: Some(10) }),
            2,
            Some(archive),
            None,
            InMemoryStore::new(),
        );

        let exit = runner.run().await.unwrap();
        assert_eq!(exit, ExitReason::RangeComplete);
        assert_eq!(runner.last_committed, Some((10, hash(10))));
        assert_eq!(runner.handler.batches.len(), 1);
        assert_eq!(runner.handler.batches[0].heights, (0..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn catching_up_to_the_archive_tip_switches_to_hot_polling() {
        let blocks = (0..=10).map(|h| block_at(h, hash(h as u8), hash(h.saturating_sub(1) as u8))).collect();
        let archive = FakeArchiveSource::new(blocks, 10);
        let block_11 = block_at(11, hash(11), hash(10));
        let hot = FakeHotSource::new(vec![HotPoll::Blocks(vec![block_11])], HashMap::new());

        let mut runner = new_runner(
            Some(HeightRange { from: 0, to: Some(11) }),
            2,
            Some(archive),
            Some(hot),
            InMemoryStore::new(),
        );

        let exit = runner.run().await.unwrap();
        assert_eq!(exit, ExitReason::RangeComplete);
        assert_eq!(runner.last_committed, Some((11, hash(11))));
        assert_eq!(runner.handler.batches.len(), 2);
        assert_eq!(runner.handler.batches[0].heights, (0..=10).collect::<Vec<_>>());
        assert!(runner.handler.batches[0].is_head);
        assert_eq!(runner.handler.batches[1].heights, vec![11]);
        assert!(runner.handler.batches[1].is_head);
    }

    #[tokio::test]
    async fn a_reorg_rolls_back_to_the_surviving_ancestor_and_resumes() {
        let store = InMemoryStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.commit_status(5, hash(5)).await.unwrap();
            tx.insert_hot_block(3, hash(3)).await.unwrap();
            tx.insert_hot_block(4, hash(4)).await.unwrap();
            tx.insert_hot_block(5, hash(5)).await.unwrap();
            InMemoryStore::commit(tx).await.unwrap();
        }

        let mut canonical = HashMap::new();
        canonical.insert(5, hash(0xaa));
        canonical.insert(4, hash(4));
        let hot = FakeHotSource::new(vec![HotPoll::Reorg { fork_height: 5 }], canonical);

        let mut runner = new_runner(None, 2, None, Some(hot), store);

        // Drive the state machine directly rather than through `run`, since
        // this fixture's scripted hot source has nothing queued beyond the
        // single reorg event and `run` would otherwise poll forever.
        runner.init().await.unwrap();
        assert_eq!(runner.state, RunnerState::Hot);
        assert_eq!(runner.last_committed, Some((5, hash(5))));

        runner.step_hot().await.unwrap();
        assert_eq!(runner.state, RunnerState::Reorg { fork_height: 5 });

        runner.handle_reorg(5).await.unwrap();
        assert_eq!(runner.state, RunnerState::Hot);
        assert_eq!(runner.last_committed, Some((4, hash(4))));
    }
}
