use backoff::ExponentialBackoff;
use ei_mapper::map_block_data;
use ei_types::{BatchRequest, BatchResponse, ClosedRange, FullBlockData};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::error::ArchiveError;
use crate::protocol::{HeightResponse, QueryRequest, QueryResponse};

/// HTTP client for the archive's bulk finalized-data endpoint (C4).
pub struct ArchiveClient {
    http: reqwest::Client,
    base_url: String,
    backoff: ExponentialBackoff,
}

impl ArchiveClient {
    /// `backoff` governs retry of transient failures; pass
    /// `ExponentialBackoff { max_elapsed_time: None, ..Default::default() }`
    /// for the unbounded-by-default retry budget described in `# 4.4`.
    pub fn new(base_url: impl Into<String>, http: reqwest::Client, backoff: ExponentialBackoff) -> Self {
        Self { http, base_url: base_url.into(), backoff }
    }

    #[instrument(skip(self))]
    pub async fn get_finalized_height(&self) -> Result<u64, ArchiveError> {
        let url = format!("{}/height", self.base_url);
        let response: HeightResponse =
            self.execute(|| self.http.get(&url), "getFinalizedHeight").await?;
        Ok(response.height)
    }

    #[instrument(skip(self, req))]
    pub async fn get_finalized_batch(&self, req: &BatchRequest) -> Result<BatchResponse, ArchiveError> {
        let fields = req.request.fields.clone().unwrap_or_default();
        let url = format!("{}/query", self.base_url);

        let query = QueryRequest {
            from_block: req.range.from,
            to_block: req.range.to,
            include_all_blocks: req.request.include_all_blocks,
            transactions: &req.request.transactions,
            logs: &req.request.logs,
        };
        let response: QueryResponse =
            self.execute(|| self.http.post(&url).json(&query), "getFinalizedBatch").await?;

        let range_to = response.next_block.saturating_sub(1);
        let mut blocks = map_wire_blocks(response.data, &fields)?;
        blocks.sort_by_key(|block| block.header.height);

        if blocks.last().map(|block| block.header.height) != Some(range_to) {
            self.backfill_trailing_header(&url, range_to, &fields, &mut blocks).await?;
        }

        Ok(BatchResponse {
            range: ClosedRange { from: req.range.from, to: range_to },
            blocks,
            chain_height: response.archive_height,
        })
    }

    /// Issues the follow-up single-height, headers-only query used when the
    /// archive's batch response is missing data at `range.to` (`# 4.4` step
    /// 4), and appends the resulting stub block.
    async fn backfill_trailing_header(
        &self,
        url: &str,
        height: u64,
        fields: &ei_types::FieldSelection,
        blocks: &mut Vec<FullBlockData>,
    ) -> Result<(), ArchiveError> {
        let query = QueryRequest {
            from_block: height,
            to_block: Some(height),
            include_all_blocks: true,
            transactions: &[],
            logs: &[],
        };
        let response: QueryResponse = self
            .execute(|| self.http.post(url).json(&query), "getFinalizedBatch:backfill")
            .await?;

        let mut trailing = map_wire_blocks(response.data, fields)?;
        blocks.append(&mut trailing);
        Ok(())
    }

    async fn execute<T, F>(&self, build: F, archive_query: &'static str) -> Result<T, ArchiveError>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let operation = || async {
            let response = build().send().await.map_err(|err| {
                if err.is_timeout() || err.is_connect() {
                    backoff::Error::transient(ArchiveError::Transport(err))
                } else {
                    backoff::Error::permanent(ArchiveError::Transport(err))
                }
            })?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let err = ArchiveError::Status { archive_query, status, body };
                return if err.is_retryable() {
                    Err(backoff::Error::transient(err))
                } else {
                    Err(backoff::Error::permanent(err))
                };
            }

            response
                .json::<T>()
                .await
                .map_err(|err| backoff::Error::permanent(ArchiveError::Transport(err)))
        };

        backoff::future::retry(self.backoff.clone(), operation).await
    }
}

fn map_wire_blocks(
    data: Vec<Vec<ei_mapper::wire::WireBlockData>>,
    fields: &ei_types::FieldSelection,
) -> Result<Vec<FullBlockData>, ArchiveError> {
    data.into_iter()
        .flatten()
        .map(|wire| {
            let block_height = wire.header.number;
            map_block_data(wire, fields).map_err(|source| ArchiveError::Mapping { block_height, source })
        })
        .collect()
}
