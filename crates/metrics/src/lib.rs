//! Ambient Prometheus instrumentation for the indexing framework.
//!
//! The concrete metric taxonomy is a product decision external to the core
//! (`# 1`); this crate only owns the instrumentation points the Runner and
//! stores call into, and the exporter that serves them over `setPrometheusPort`.
//! Call sites use the `metrics` crate facade directly (`metrics::counter!`,
//! `metrics::histogram!`); [`install`] wires that facade to an HTTP-exposed
//! Prometheus recorder, in the spirit of `consensus-metrics`'s registry
//! service but without hand-rolling a registration layer for every counter.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("installing the Prometheus recorder: {0}")]
    Install(#[from] metrics_exporter_prometheus::BuildError),
}

/// Installs the process-global Prometheus recorder and starts its HTTP
/// listener on `0.0.0.0:port`, exposing `/metrics` in text format.
///
/// Must be called at most once per process, before any `metrics::*!` call
/// site fires — a second call replaces the global recorder, which
/// `metrics-exporter-prometheus` itself treats as a programmer error.
pub fn install(port: u16) -> Result<(), MetricsError> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    Ok(())
}

/// Phase label for batch-shaped counters: which upstream produced the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Archive,
    Hot,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Phase::Archive => "archive",
            Phase::Hot => "hot",
        }
    }
}

/// Records one processed batch: its block count and the wall time the
/// handler transaction took, labeled by [`Phase`].
pub fn record_batch(phase: Phase, blocks: u64, elapsed: Duration) {
    metrics::counter!("ei_indexer_batches_processed_total", "phase" => phase.label()).increment(1);
    metrics::counter!("ei_indexer_blocks_processed_total", "phase" => phase.label()).increment(blocks);
    metrics::histogram!("ei_indexer_batch_duration_seconds", "phase" => phase.label())
        .record(elapsed.as_secs_f64());
}

/// Records rows mutated through the row-ops interface, labeled by table and
/// operation (`insert`/`upsert`/`delete`).
pub fn record_rows_changed(table: &str, op: &'static str, count: u64) {
    metrics::counter!("ei_indexer_rows_changed_total", "table" => table.to_string(), "op" => op)
        .increment(count);
}

/// Records the number of hot blocks undone by a single **REORG** episode.
pub fn record_reorg_depth(depth: u64) {
    metrics::histogram!("ei_indexer_reorg_depth_blocks").record(depth as f64);
    metrics::counter!("ei_indexer_reorgs_total").increment(1);
}

/// Records round-trip latency to an upstream source, labeled by name
/// (`"archive"` or `"rpc"`).
pub fn record_upstream_latency(source: &'static str, elapsed: Duration) {
    metrics::histogram!("ei_indexer_upstream_latency_seconds", "source" => source)
        .record(elapsed.as_secs_f64());
}

/// Tracks the Runner's last-committed height as a gauge, so it can be read
/// alongside `rate()` of the counters above without joining external logs.
pub fn set_committed_height(height: u64) {
    metrics::gauge!("ei_indexer_committed_height").set(height as f64);
}
