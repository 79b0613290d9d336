use ei_mapper::MapperError;
use thiserror::Error;

/// Errors surfaced by [`crate::ArchiveClient`].
///
/// Classified into retryable and fatal the way the Runner expects
/// (`# 4.4`): transport-level failures and 5xx responses are retried by the
/// backoff wrapper before ever reaching the caller, so everything that
/// escapes here has already been judged non-retryable (or retries were
/// exhausted).
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("archive returned status {status} querying {archive_query}: {body}")]
    Status { archive_query: &'static str, status: reqwest::StatusCode, body: String },

    #[error("mapping block at height {block_height}: {source}")]
    Mapping { block_height: u64, #[source] source: MapperError },
}

impl ArchiveError {
    /// Whether the Runner should retry the batch that produced this error
    /// rather than treat it as fatal.
    pub fn is_retryable(&self) -> bool {
        match self {
            ArchiveError::Transport(_) => true,
            ArchiveError::Status { status, .. } => status.is_server_error(),
            ArchiveError::Mapping { .. } => false,
        }
    }
}
