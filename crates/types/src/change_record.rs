//! Row-level mutation records for the reorg-safe hot-state change log.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A JSON-serializable column value, as read back from the store's pre-image
/// for `update`/`delete` records. Kept deliberately loose (the store schema
/// is an external collaborator, per `# 1`) rather than typed per-table.
pub type ColumnValues = BTreeMap<String, serde_json::Value>;

/// A single row-level mutation performed by the handler while processing an
/// unfinalized block.
///
/// Recorded in the persistent side table keyed by `(blockHeight, index)`
/// with a monotonically increasing per-block `index` (see `# 4.7`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeRecord {
    Insert {
        table: String,
        id: String,
    },
    Update {
        table: String,
        id: String,
        prior_fields: ColumnValues,
    },
    Delete {
        table: String,
        id: String,
        prior_fields: ColumnValues,
    },
}

impl ChangeRecord {
    pub fn table(&self) -> &str {
        match self {
            ChangeRecord::Insert { table, .. }
            | ChangeRecord::Update { table, .. }
            | ChangeRecord::Delete { table, .. } => table,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ChangeRecord::Insert { id, .. }
            | ChangeRecord::Update { id, .. }
            | ChangeRecord::Delete { id, .. } => id,
        }
    }
}
