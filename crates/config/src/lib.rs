//! Declarative configuration surface for the EVM indexing framework
//! (`# 6`): the `setX`/`addX` options recognized by a processor, realized
//! as a typed builder plus YAML/JSON file loading, following `tn-config`'s
//! split between a programmatic builder and `serde_yaml`-backed files.

mod builder;
mod config;
mod error;
mod options;

pub use builder::ProcessorConfigBuilder;
pub use config::{ProcessorConfig, DEFAULT_NETWORK_TIMEOUT, DEFAULT_SAFETY_DEPTH};
pub use error::ConfigError;
pub use options::{DataSourceConfig, IncludeAllBlocksOptions, LogOptions, TxOptions};
