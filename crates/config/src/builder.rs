//! The programmatic `setX`/`addX` builder surface (`# 6`).

use std::time::Duration;

use alloy::primitives::{Address, B256};
use ei_types::{FieldSelectionInput, HeightRange, Sighash};

use crate::{
    config::ProcessorConfig,
    error::ConfigError,
    options::{DataSourceConfig, IncludeAllBlocksOptions, LogOptions, TxOptions},
};

/// Builds a [`ProcessorConfig`] through the declarative interface described
/// in `# 6`: `setFields`, `addLog`, `addTransaction`, `includeAllBlocks`,
/// `setBlockRange`, `setDataSource`, `setPrometheusPort`.
#[derive(Debug, Default)]
pub struct ProcessorConfigBuilder {
    config: ProcessorConfig,
}

impl ProcessorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fields(mut self, fields: FieldSelectionInput) -> Self {
        self.config.fields = fields;
        self
    }

    pub fn add_log(mut self, address: &[&str], filter: &[&[&str]], range: Option<HeightRange>) -> Result<Self, ConfigError> {
        let address = address.iter().map(|s| parse_address(s)).collect::<Result<_, _>>()?;
        let filter = filter
            .iter()
            .map(|alternatives| alternatives.iter().map(|s| parse_topic(s)).collect())
            .collect::<Result<_, _>>()?;
        self.config.logs.push(LogOptions { address, filter, range });
        Ok(self)
    }

    pub fn add_transaction(
        mut self,
        to: &[&str],
        from: &[&str],
        sighash: &[&str],
        range: Option<HeightRange>,
    ) -> Result<Self, ConfigError> {
        let to = to.iter().map(|s| parse_address(s)).collect::<Result<_, _>>()?;
        let from = from.iter().map(|s| parse_address(s)).collect::<Result<_, _>>()?;
        let sighash = sighash.iter().map(|s| parse_sighash(s)).collect::<Result<_, _>>()?;
        self.config.transactions.push(TxOptions { to, from, sighash, range });
        Ok(self)
    }

    pub fn include_all_blocks(mut self, range: Option<HeightRange>) -> Self {
        self.config.include_all_blocks.push(IncludeAllBlocksOptions { range });
        self
    }

    pub fn set_block_range(mut self, range: Option<HeightRange>) -> Self {
        self.config.block_range = range;
        self
    }

    pub fn set_data_source(mut self, archive_url: Option<String>, rpc_url: Option<String>) -> Self {
        self.config.data_source = DataSourceConfig { archive_url, rpc_url };
        self
    }

    pub fn set_prometheus_port(mut self, port: u16) -> Self {
        self.config.prometheus_port = Some(port);
        self
    }

    pub fn set_schema(mut self, schema: impl Into<String>) -> Self {
        self.config.schema = schema.into();
        self
    }

    pub fn set_safety_depth(mut self, safety_depth: u64) -> Self {
        self.config.safety_depth = safety_depth;
        self
    }

    pub fn set_rpc_poll_interval(mut self, interval: Duration) -> Self {
        self.config.rpc_poll_interval = interval;
        self
    }

    /// Validates and finalizes the configuration.
    ///
    /// Enforces `# 6`'s `setDataSource` requirement ("at least one
    /// required"); every other field already carries a safe default.
    pub fn build(self) -> Result<ProcessorConfig, ConfigError> {
        let data_source = &self.config.data_source;
        if data_source.archive_url.is_none() && data_source.rpc_url.is_none() {
            return Err(ConfigError::MissingDataSource);
        }
        Ok(self.config)
    }
}

/// Parses and normalizes a user-supplied address to lowercase hex (`# 6`).
fn parse_address(raw: &str) -> Result<Address, ConfigError> {
    raw.parse().map_err(|err: <Address as std::str::FromStr>::Err| ConfigError::InvalidAddress {
        value: raw.to_string(),
        reason: err.to_string(),
    })
}

/// Parses and normalizes a user-supplied topic value to lowercase hex
/// (`# 6`).
fn parse_topic(raw: &str) -> Result<B256, ConfigError> {
    raw.parse().map_err(|err: <B256 as std::str::FromStr>::Err| ConfigError::InvalidTopic {
        value: raw.to_string(),
        reason: err.to_string(),
    })
}

/// Parses and normalizes a user-supplied sighash to lowercase hex (`# 6`,
/// scenario S5).
fn parse_sighash(raw: &str) -> Result<Sighash, ConfigError> {
    raw.parse().map_err(|err: <Sighash as std::str::FromStr>::Err| ConfigError::InvalidSighash {
        value: raw.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_without_data_source_is_rejected() {
        let err = ProcessorConfigBuilder::new().build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingDataSource));
    }

    #[test]
    fn build_with_archive_only_succeeds() {
        let config = ProcessorConfigBuilder::new()
            .set_data_source(Some("http://archive".to_string()), None)
            .build()
            .unwrap();
        assert_eq!(config.data_source.archive_url.as_deref(), Some("http://archive"));
    }

    #[test]
    fn sighash_normalizes_to_lowercase_hex() {
        let builder = ProcessorConfigBuilder::new()
            .set_data_source(Some("http://archive".to_string()), None)
            .add_transaction(&[], &[], &["0xA9059CBB"], None)
            .unwrap();
        let config = builder.build().unwrap();
        assert_eq!(config.transactions[0].sighash[0].to_string(), "0xa9059cbb");
    }

    #[test]
    fn invalid_address_is_rejected_with_context() {
        let err = ProcessorConfigBuilder::new().add_log(&["not-an-address"], &[], None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddress { .. }));
    }
}
