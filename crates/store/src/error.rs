use thiserror::Error;

/// Errors surfaced by the row-ops store interface and the internal
/// status/hot-block/change-log tables.
///
/// Store errors are fatal (`# 7`): there is no retry policy at this layer,
/// unlike the transport errors owned by the archive/RPC clients.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("serializing change record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("identifier `{0}` cannot be safely quoted")]
    InvalidIdentifier(String),

    #[error("row `{table}.{id}` is missing an `id` field")]
    MissingId { table: String, id: String },
}

/// Errors surfaced by [`crate::RollbackEngine`].
///
/// `Invariant` covers the "detected gap, height regress, or missing
/// pre-image" case from `# 7`: a partial rollback would corrupt the data
/// view, so it is always fatal.
#[derive(Debug, Error)]
pub enum RollbackError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("rollback invariant violation at height {height}: {reason}")]
    Invariant { height: u64, reason: String },
}
