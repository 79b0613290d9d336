use alloy::primitives::B256;

/// The Runner's state machine (`# 4.6`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerState {
    /// Loading the last committed position from the store.
    Init,
    /// Requesting finalized batches from the archive.
    Archive,
    /// Polling the RPC hot source for new chain-tip blocks.
    Hot,
    /// Undoing hot blocks back to the surviving ancestor after a fork was
    /// detected at `fork_height`.
    Reorg { fork_height: u64 },
}

/// Why [`crate::Runner::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The configured `blockRange` had no heights at all (scenario S1).
    EmptyRange,
    /// The committed height reached the configured closed `blockRange`
    /// upper bound (`# 4.6`, "Termination").
    RangeComplete,
    /// A termination signal was observed between batches (`# 5`).
    Cancelled,
}

/// `(height, hash)` of the last-seen, last-committed block.
pub type Position = (u64, B256);
