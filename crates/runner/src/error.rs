use thiserror::Error;

/// Errors surfaced by the Runner (`# 7`).
///
/// Aggregates every lower layer's error type the way `NodeError`
/// aggregates `SubscriberError`/`ExecutionError`/`prometheus::Error` in the
/// reference workspace; the Runner is the one place that decides fatality
/// (transport retry is owned by the archive/RPC clients themselves).
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Archive(#[from] ei_archive::ArchiveError),

    #[error(transparent)]
    Rpc(#[from] ei_rpc::RpcError),

    #[error(transparent)]
    Store(#[from] ei_store::StoreError),

    #[error(transparent)]
    Rollback(#[from] ei_store::RollbackError),

    #[error("handler failed processing batch {from}..={to}: {source}")]
    Handler {
        from: u64,
        to: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invariant violation: {0}")]
    Invariant(String),

    #[error("no data source configured: archive and RPC hot source are both absent")]
    NoDataSource,
}

impl RunnerError {
    /// Whether the Runner should retry the batch that produced this error
    /// rather than treat it as fatal (`# 7`).
    pub fn is_retryable(&self) -> bool {
        match self {
            RunnerError::Archive(err) => err.is_retryable(),
            RunnerError::Rpc(_) => true,
            RunnerError::Handler { .. } => true,
            RunnerError::Store(_)
            | RunnerError::Rollback(_)
            | RunnerError::Invariant(_)
            | RunnerError::NoDataSource => false,
        }
    }
}
