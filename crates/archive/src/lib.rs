//! Archive HTTP bulk ingestion source (C4): retrieves finalized block data
//! in bulk over HTTP and maps it into the canonical model.

mod client;
mod error;
mod protocol;

pub use client::ArchiveClient;
pub use error::ArchiveError;

#[cfg(test)]
mod tests {
    use crate::protocol::QueryRequest;

    #[test]
    fn query_request_serializes_with_camel_case_field_names() {
        let logs = vec![];
        let transactions = vec![];
        let query = QueryRequest {
            from_block: 10,
            to_block: Some(20),
            include_all_blocks: false,
            transactions: &transactions,
            logs: &logs,
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["fromBlock"], 10);
        assert_eq!(value["toBlock"], 20);
        assert_eq!(value["includeAllBlocks"], false);
    }
}
