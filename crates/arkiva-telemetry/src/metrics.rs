//! Prometheus-backed metrics registry for the relocation pipeline.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Counter increments return the new total so callers can emit progress
//!   logs at fixed intervals without keeping their own tallies.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry shared across pipeline stages.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    files_enqueued_total: IntCounter,
    files_moved_total: IntCounter,
    batches_processed_total: IntCounter,
    lookup_failures_total: IntCounter,
    folder_conflicts_total: IntCounter,
    move_failures_total: IntCounter,
    file_queue_depth: IntGauge,
    move_queue_depth: IntGauge,
}

/// Snapshot of the pipeline counters and gauges for end-of-run reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Total files enqueued by the walker.
    pub files_enqueued_total: u64,
    /// Total files relocated on disk.
    pub files_moved_total: u64,
    /// Total metadata lookup batches processed.
    pub batches_processed_total: u64,
    /// Total files skipped because no metadata record matched.
    pub lookup_failures_total: u64,
    /// Total folder creations lost to a concurrent winner.
    pub folder_conflicts_total: u64,
    /// Total files that failed to relocate.
    pub move_failures_total: u64,
    /// Current depth of the file queue.
    pub file_queue_depth: i64,
    /// Current depth of the move queue.
    pub move_queue_depth: i64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built
    /// or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let files_enqueued_total = build_counter(
            "files_enqueued_total",
            "Files discovered in the staging directory and enqueued",
        )?;
        let files_moved_total =
            build_counter("files_moved_total", "Files relocated to the library tree")?;
        let batches_processed_total = build_counter(
            "batches_processed_total",
            "Metadata lookup batches processed",
        )?;
        let lookup_failures_total = build_counter(
            "lookup_failures_total",
            "Files skipped because no metadata record matched their token",
        )?;
        let folder_conflicts_total = build_counter(
            "folder_conflicts_total",
            "Folder creations lost to a concurrent winner",
        )?;
        let move_failures_total =
            build_counter("move_failures_total", "Files that failed to relocate")?;
        let file_queue_depth = build_gauge("file_queue_depth", "Queued files awaiting lookup")?;
        let move_queue_depth = build_gauge("move_queue_depth", "Resolved moves awaiting workers")?;

        register(&registry, "files_enqueued_total", &files_enqueued_total)?;
        register(&registry, "files_moved_total", &files_moved_total)?;
        register(
            &registry,
            "batches_processed_total",
            &batches_processed_total,
        )?;
        register(&registry, "lookup_failures_total", &lookup_failures_total)?;
        register(&registry, "folder_conflicts_total", &folder_conflicts_total)?;
        register(&registry, "move_failures_total", &move_failures_total)?;
        register(&registry, "file_queue_depth", &file_queue_depth)?;
        register(&registry, "move_queue_depth", &move_queue_depth)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                files_enqueued_total,
                files_moved_total,
                batches_processed_total,
                lookup_failures_total,
                folder_conflicts_total,
                move_failures_total,
                file_queue_depth,
                move_queue_depth,
            }),
        })
    }

    /// Record an enqueued file and return the running total.
    pub fn inc_file_enqueued(&self) -> u64 {
        self.inner.files_enqueued_total.inc();
        self.inner.files_enqueued_total.get()
    }

    /// Record a relocated file and return the running total.
    pub fn inc_file_moved(&self) -> u64 {
        self.inner.files_moved_total.inc();
        self.inner.files_moved_total.get()
    }

    /// Record a processed lookup batch.
    pub fn inc_batch_processed(&self) {
        self.inner.batches_processed_total.inc();
    }

    /// Record a file whose token matched no metadata record.
    pub fn inc_lookup_failure(&self) {
        self.inner.lookup_failures_total.inc();
    }

    /// Record a folder creation lost to a concurrent winner.
    pub fn inc_folder_conflict(&self) {
        self.inner.folder_conflicts_total.inc();
    }

    /// Record a file that failed to relocate.
    pub fn inc_move_failure(&self) {
        self.inner.move_failures_total.inc();
    }

    /// Set the file queue depth gauge.
    pub fn set_file_queue_depth(&self, depth: i64) {
        self.inner.file_queue_depth.set(depth);
    }

    /// Set the move queue depth gauge.
    pub fn set_move_queue_depth(&self, depth: i64) {
        self.inner.move_queue_depth.set(depth);
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of all counters and gauges.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            files_enqueued_total: self.inner.files_enqueued_total.get(),
            files_moved_total: self.inner.files_moved_total.get(),
            batches_processed_total: self.inner.batches_processed_total.get(),
            lookup_failures_total: self.inner.lookup_failures_total.get(),
            folder_conflicts_total: self.inner.folder_conflicts_total.get(),
            move_failures_total: self.inner.move_failures_total.get(),
            file_queue_depth: self.inner.file_queue_depth.get(),
            move_queue_depth: self.inner.move_queue_depth.get(),
        }
    }
}

fn build_counter(name: &'static str, help: &str) -> Result<IntCounter> {
    IntCounter::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn build_gauge(name: &'static str, help: &str) -> Result<IntGauge> {
    IntGauge::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}
