//! Store trait (row-ops interface), Change Tracker (C7), and Rollback
//! Engine (C8) for the EVM indexing framework.
//!
//! Entity-ORM semantics — column reflection, connection pooling, schema
//! migration — are external collaborators (`# 1`); this crate defines the
//! narrow interface the core interacts with the store through, a Postgres
//! realization of it, and the reorg-safety machinery built on top.

mod change_log;
mod change_tracker;
mod error;
mod ident;
mod postgres;
mod rollback;
mod row_ops;
mod status;
mod transactional;

pub use change_log::{ChangeLogSink, ChangeLogSource};
pub use change_tracker::ChangeTracker;
pub use error::{RollbackError, StoreError};
pub use ident::quote_ident;
pub use postgres::{PgStore, PgTx};
pub use rollback::RollbackEngine;
pub use row_ops::{row_id, Row, StoreRowOps};
pub use status::StatusStore;
pub use transactional::TransactionalStore;
