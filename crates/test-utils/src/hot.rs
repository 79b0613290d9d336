//! A canned stand-in for the RPC chain-tip follower (C5), driven by a
//! pre-scripted sequence of poll outcomes rather than a live node.

use std::collections::{HashMap, VecDeque};

use alloy::primitives::B256;
use async_trait::async_trait;
use ei_rpc::HotPoll;
use ei_runner::{HotSource, RunnerError};
use ei_types::FieldSelection;

/// Replays a scripted sequence of [`HotPoll`] outcomes, one per `poll`
/// call, falling back to [`HotPoll::UpToDate`] once the script is
/// exhausted. `canonical` backs `canonical_hash_at`, simulating the live
/// chain's own view during a **REORG** ancestor walk.
pub struct FakeHotSource {
    script: VecDeque<HotPoll>,
    canonical: HashMap<u64, B256>,
    last_seen: Option<(u64, B256)>,
}

impl FakeHotSource {
    pub fn new(script: Vec<HotPoll>, canonical: HashMap<u64, B256>) -> Self {
        Self { script: script.into(), canonical, last_seen: None }
    }

    /// The height/hash most recently accepted via `resume_from`, for test
    /// assertions on how the Runner resolved a reorg.
    pub fn last_seen(&self) -> Option<(u64, B256)> {
        self.last_seen
    }
}

#[async_trait]
impl HotSource for FakeHotSource {
    async fn poll(&mut self, _fields: &FieldSelection) -> Result<HotPoll, RunnerError> {
        Ok(self.script.pop_front().unwrap_or(HotPoll::UpToDate))
    }

    fn resume_from(&mut self, height: u64, hash: B256) {
        self.last_seen = Some((height, hash));
    }

    async fn canonical_hash_at(&self, height: u64) -> Result<B256, RunnerError> {
        self.canonical
            .get(&height)
            .copied()
            .ok_or_else(|| RunnerError::Invariant(format!("no canonical hash recorded for height {height}")))
    }
}
