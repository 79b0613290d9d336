use thiserror::Error;

/// Errors building or loading a [`crate::ProcessorConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("setDataSource: at least one of `archive` or `chain` is required")]
    MissingDataSource,

    #[error("invalid sighash `{value}`: {reason}")]
    InvalidSighash { value: String, reason: String },

    #[error("invalid address `{value}`: {reason}")]
    InvalidAddress { value: String, reason: String },

    #[error("invalid topic `{value}`: {reason}")]
    InvalidTopic { value: String, reason: String },

    #[error("reading config file {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("parsing config file {path}: {source}")]
    Yaml { path: String, #[source] source: serde_yaml::Error },
}
