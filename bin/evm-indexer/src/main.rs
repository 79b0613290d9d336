mod handler;

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::process::ExitCode;

use backoff::ExponentialBackoff;
use clap::Parser;
use ei_config::ProcessorConfig;
use ei_rpc::RpcHotSource;
use ei_runner::{ExitReason, Runner};
use ei_store::PgStore;
use eyre::WrapErr;
use tracing::{error, info};

use handler::DefaultHandler;

/// Runs the EVM indexing framework against a declarative processor config.
#[derive(Debug, Parser)]
#[command(name = "evm-indexer", about = "Dual-source EVM block/tx/log indexer")]
struct Cli {
    /// Path to the processor's YAML configuration file (`# 6`).
    #[arg(long, env = "EVM_INDEXER_CONFIG")]
    config: PathBuf,

    /// Postgres connection string for the persistent store.
    ///
    /// Deliberately separate from the declarative `ProcessorConfig`: which
    /// database to write to is a deployment concern, not one of the
    /// `setX`/`addX` options a processor declares (`# 6`).
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run().await {
        Ok(ExitReason::EmptyRange | ExitReason::RangeComplete | ExitReason::Cancelled) => ExitCode::SUCCESS,
        Err(err) => {
            error!(?err, "fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> eyre::Result<ExitReason> {
    let cli = Cli::parse();

    let config = ProcessorConfig::from_file(&cli.config)
        .wrap_err_with(|| format!("loading config from {}", cli.config.display()))?;

    if let Some(port) = config.prometheus_port {
        ei_metrics::install(port).wrap_err("installing the Prometheus recorder")?;
        info!(port, "metrics listening");
    }

    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect(&cli.database_url)
        .await
        .wrap_err("connecting to the store")?;
    let store = PgStore::new(pool, config.schema.clone());

    let archive = match &config.data_source.archive_url {
        Some(url) => {
            let http = reqwest::Client::builder()
                .timeout(config.network_timeout)
                .build()
                .wrap_err("building the archive HTTP client")?;
            let backoff = ExponentialBackoff { max_elapsed_time: None, ..Default::default() };
            Some(Box::new(ei_archive::ArchiveClient::new(url.clone(), http, backoff))
                as Box<dyn ei_runner::ArchiveSource>)
        }
        None => None,
    };

    let hot = match &config.data_source.rpc_url {
        Some(url) => {
            let provider = alloy::providers::ProviderBuilder::new()
                .on_http(url.parse().wrap_err_with(|| format!("parsing rpc url {url}"))?);
            let rps = NonZeroU32::new(config.rpc_requests_per_second).unwrap_or(NonZeroU32::MIN);
            Some(Box::new(RpcHotSource::new(provider, rps, None)) as Box<dyn ei_runner::HotSource>)
        }
        None => None,
    };

    // `merge_requests` splits declared filters into non-overlapping
    // height buckets; a processor whose `addLog`/`addTransaction`
    // declarations carry disjoint or only partially overlapping
    // per-filter ranges compiles to more than one bucket here. This
    // binary drives the first bucket only — running several buckets
    // concurrently needs one Runner per bucket, left to the embedding
    // application rather than this reference process.
    let merged = ei_query::merge_requests(&config.to_batch_requests(), config.block_range);
    let Some(request) = merged.into_iter().next() else {
        info!("no batch requests compiled from the config, nothing to do");
        return Ok(ExitReason::EmptyRange);
    };

    let fields = config.resolved_fields();
    let mut runner = Runner::new(
        fields,
        request.request,
        config.block_range,
        config.safety_depth,
        archive,
        hot,
        store,
        DefaultHandler::default(),
    )?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let exit = runner.run_cancellable(shutdown_rx).await?;
    info!(?exit, "runner stopped");
    Ok(exit)
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .expect("installing SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
