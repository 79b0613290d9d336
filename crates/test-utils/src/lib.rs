//! Fixtures for exercising the Runner and its collaborators without a live
//! archive, RPC node, or Postgres instance: an in-memory store, scripted
//! archive/hot sources, and a recording handler.

mod archive;
mod handler;
mod hot;
mod store;

pub use archive::FakeArchiveSource;
pub use handler::{RecordedBatch, RecordingHandler};
pub use hot::FakeHotSource;
pub use store::InMemoryStore;
