//! The Runner (C6): plans batches from a configured data request and drives
//! them through the ARCHIVE/HOT/REORG state machine (`# 4.6`) against a
//! user-supplied handler and store.

mod error;
mod handler;
mod runner;
mod sources;
mod state;

pub use error::RunnerError;
pub use handler::{Handler, HandlerContext};
pub use runner::Runner;
pub use sources::{ArchiveSource, HotSource};
pub use state::{ExitReason, Position, RunnerState};
