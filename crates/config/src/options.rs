//! Per-filter declarations accepted by [`crate::ProcessorConfigBuilder`].

use alloy::primitives::{Address, B256};
use ei_types::{HeightRange, LogCriterion, Sighash, TxCriterion};
use serde::{Deserialize, Serialize};

/// `addLog` options (`# 6`): `{address?, filter?, range?}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogOptions {
    pub address: Vec<Address>,
    /// Per-position topic alternatives, named `filter` in the external
    /// interface (`# 6`) and `topics` on the wire criterion it compiles to.
    pub filter: Vec<Vec<B256>>,
    pub range: Option<HeightRange>,
}

impl From<LogOptions> for LogCriterion {
    fn from(opts: LogOptions) -> Self {
        LogCriterion { address: opts.address, topics: opts.filter }
    }
}

/// `addTransaction` options (`# 6`): `{to?, from?, sighash?, range?}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TxOptions {
    pub to: Vec<Address>,
    pub from: Vec<Address>,
    pub sighash: Vec<Sighash>,
    pub range: Option<HeightRange>,
}

impl From<TxOptions> for TxCriterion {
    fn from(opts: TxOptions) -> Self {
        TxCriterion { to: opts.to, from: opts.from, sighash: opts.sighash }
    }
}

/// `includeAllBlocks` options (`# 6`): `{range?}`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IncludeAllBlocksOptions {
    pub range: Option<HeightRange>,
}

/// `setDataSource` options (`# 6`): at least one of `archive`/`chain`
/// required, enforced at `.build()` time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourceConfig {
    pub archive_url: Option<String>,
    pub rpc_url: Option<String>,
}
