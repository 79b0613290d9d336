//! Canonical data model for the EVM indexing framework.
//!
//! Everything downstream of the two upstream sources — the archive and the
//! RPC hot source — speaks in terms of the types defined here: blocks,
//! transactions, logs, the per-block item union, and the request/response
//! shapes that move between the planner, the sources, and the Runner.

pub mod batch;
pub mod block;
pub mod block_item;
pub mod change_record;
pub mod field_selection;
pub mod full_block_data;
pub mod id;
pub mod log;
pub mod request;
pub mod transaction;

pub use batch::BatchResponse;
pub use block::Block;
pub use block_item::{block_item_order, sort_items, BlockItem};
pub use change_record::{ChangeRecord, ColumnValues};
pub use field_selection::{
    BlockFields, BlockFieldsInput, FieldSelection, FieldSelectionInput, LogFields, LogFieldsInput,
    TransactionFields, TransactionFieldsInput,
};
pub use full_block_data::FullBlockData;
pub use id::format_id;
pub use log::Log;
pub use request::{
    BatchRequest, ClosedRange, DataRequest, HeightRange, LogCriterion, Sighash, TxCriterion,
};
pub use transaction::Transaction;
