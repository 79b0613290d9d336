//! The resolved, immutable configuration a processor runs with.

use std::time::Duration;

use ei_types::{BatchRequest, DataRequest, FieldSelection, FieldSelectionInput, HeightRange};
use serde::{Deserialize, Serialize};

use crate::options::{DataSourceConfig, IncludeAllBlocksOptions, LogOptions, TxOptions};

/// Default number of blocks below the archive's head treated as finalized
/// for routing purposes (`# GLOSSARY`, "Safety depth").
pub const DEFAULT_SAFETY_DEPTH: u64 = 5;

/// Baseline network timeout (`# 5`: "20 s baseline").
pub const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(20);

const fn default_safety_depth() -> u64 {
    DEFAULT_SAFETY_DEPTH
}

const fn default_network_timeout() -> Duration {
    DEFAULT_NETWORK_TIMEOUT
}

const fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

const fn default_rps() -> u32 {
    10
}

fn default_schema() -> String {
    "ei".to_string()
}

/// A fully assembled processor configuration, produced by
/// [`crate::ProcessorConfigBuilder::build`] or loaded from a YAML file.
///
/// Mirrors the declarative `setX`/`addX` interface in `# 6`: each field
/// here corresponds to one configuration option, already validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub fields: FieldSelectionInput,
    pub logs: Vec<LogOptions>,
    pub transactions: Vec<TxOptions>,
    pub include_all_blocks: Vec<IncludeAllBlocksOptions>,
    pub block_range: Option<HeightRange>,
    pub data_source: DataSourceConfig,
    pub prometheus_port: Option<u16>,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_safety_depth")]
    pub safety_depth: u64,
    #[serde(default = "default_rps")]
    pub rpc_requests_per_second: u32,
    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    pub rpc_poll_interval: Duration,
    #[serde(with = "humantime_serde", default = "default_network_timeout")]
    pub network_timeout: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            fields: FieldSelectionInput::default(),
            logs: Vec::new(),
            transactions: Vec::new(),
            include_all_blocks: Vec::new(),
            block_range: None,
            data_source: DataSourceConfig::default(),
            prometheus_port: None,
            schema: default_schema(),
            safety_depth: default_safety_depth(),
            rpc_requests_per_second: default_rps(),
            rpc_poll_interval: default_poll_interval(),
            network_timeout: default_network_timeout(),
        }
    }
}

impl ProcessorConfig {
    /// Loads a config from a YAML document, following `tn-config`'s use of
    /// `serde_yaml` for file-based configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, crate::ConfigError> {
        serde_yaml::from_str(yaml)
            .map_err(|source| crate::ConfigError::Yaml { path: "<string>".to_string(), source })
    }

    /// Loads a config from a YAML file on disk.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| crate::ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&contents)
            .map_err(|source| crate::ConfigError::Yaml { path: path.display().to_string(), source })
    }

    /// Resolves the `setFields` input into the concrete upstream mask
    /// (`# 4.1`).
    pub fn resolved_fields(&self) -> FieldSelection {
        FieldSelection::resolve(self.fields.clone())
    }

    /// Compiles every declared `addLog`/`addTransaction`/`includeAllBlocks`
    /// option into its own range-bounded [`BatchRequest`], each carrying
    /// the one-filter-kind slice it was declared with (an empty request
    /// with neither logs nor transactions declared falls back to a single
    /// request over the global range, matching the "processor with only
    /// `includeAllBlocks`" case).
    ///
    /// The caller is expected to feed these into
    /// [`ei_query::merge_requests`] before handing them to the Runner; this
    /// method does not merge or clamp, it only compiles the declared
    /// options into their wire shape.
    pub fn to_batch_requests(&self) -> Vec<BatchRequest> {
        let mut requests = Vec::new();

        for log in &self.logs {
            let range = log.range.unwrap_or_else(|| self.default_range());
            requests.push(BatchRequest {
                range,
                request: DataRequest {
                    include_all_blocks: false,
                    logs: vec![log.clone().into()],
                    transactions: vec![],
                    fields: None,
                },
            });
        }

        for tx in &self.transactions {
            let range = tx.range.unwrap_or_else(|| self.default_range());
            requests.push(BatchRequest {
                range,
                request: DataRequest {
                    include_all_blocks: false,
                    logs: vec![],
                    transactions: vec![tx.clone().into()],
                    fields: None,
                },
            });
        }

        for opt in &self.include_all_blocks {
            let range = opt.range.unwrap_or_else(|| self.default_range());
            requests.push(BatchRequest {
                range,
                request: DataRequest {
                    include_all_blocks: true,
                    logs: vec![],
                    transactions: vec![],
                    fields: None,
                },
            });
        }

        if requests.is_empty() {
            requests.push(BatchRequest {
                range: self.default_range(),
                request: DataRequest::default(),
            });
        }

        requests
    }

    fn default_range(&self) -> HeightRange {
        self.block_range.unwrap_or(HeightRange { from: 0, to: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::LogOptions;

    #[test]
    fn no_declared_filters_yields_one_request_over_the_global_range() {
        let config = ProcessorConfig {
            block_range: Some(HeightRange { from: 10, to: Some(20) }),
            ..Default::default()
        };
        let requests = config.to_batch_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].range, HeightRange { from: 10, to: Some(20) });
    }

    #[test]
    fn per_filter_range_overrides_the_global_default() {
        let config = ProcessorConfig {
            block_range: Some(HeightRange { from: 0, to: Some(100) }),
            logs: vec![LogOptions { range: Some(HeightRange { from: 5, to: Some(10) }), ..Default::default() }],
            ..Default::default()
        };
        let requests = config.to_batch_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].range, HeightRange { from: 5, to: Some(10) });
    }

    #[test]
    fn yaml_round_trips_through_serde() {
        let yaml = "schema: custom\nsafety_depth: 3\n";
        let config = ProcessorConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.schema, "custom");
        assert_eq!(config.safety_depth, 3);
    }
}
