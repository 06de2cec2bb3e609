//! Pipeline orchestration: stage wiring, worker pools, and shutdown.

use std::sync::Arc;
use std::thread;

use arkiva_config::Settings;
use arkiva_store::MetadataStore;
use arkiva_telemetry::Metrics;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task;

use crate::error::{PipelineResult, join_error};
use crate::folders::FolderResolver;
use crate::mover::run_mover;
use crate::resolver::BatchResolver;
use crate::walker::run_walker;

/// Worker pool fallback when the host parallelism cannot be read.
const DEFAULT_PARALLELISM: usize = 4;

/// Outcome of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Files the walker enqueued.
    pub files_enqueued: u64,
    /// Files the mover pool relocated.
    pub files_moved: u64,
}

/// One relocation pipeline: a walker, a resolver pool, and a mover pool
/// joined by bounded queues.
#[derive(Clone)]
pub struct PipelineEngine {
    settings: Settings,
    store: Arc<dyn MetadataStore>,
    metrics: Metrics,
    shutdown: watch::Sender<bool>,
}

impl PipelineEngine {
    /// Assemble an engine over the given store and metrics registry.
    #[must_use]
    pub fn new(settings: Settings, store: Arc<dyn MetadataStore>, metrics: Metrics) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            settings,
            store,
            metrics,
            shutdown,
        }
    }

    /// Signal every stage to stop at its next blocking point. In-flight
    /// queue items are still drained.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Run the pipeline to completion and report what moved.
    ///
    /// Stage completion propagates through channel closure: the walker drops
    /// the file sender when the walk ends, the resolvers drain and drop the
    /// move senders, then the movers drain and exit. A traversal failure
    /// stops ingestion only; everything already enqueued still flows.
    ///
    /// # Errors
    ///
    /// Returns an error if root-folder bootstrap fails or a worker task
    /// panics. Per-item failures are logged and counted, never propagated.
    pub async fn run(&self) -> PipelineResult<PipelineReport> {
        let folders = Arc::new(FolderResolver::new(
            self.store.clone(),
            self.settings.library_root_str(),
            self.metrics.clone(),
        ));
        folders.ensure_root().await?;

        let workers = thread::available_parallelism()
            .map_or(DEFAULT_PARALLELISM, std::num::NonZeroUsize::get);
        let (file_tx, file_rx) = async_channel::bounded(self.settings.queue_capacity);
        let (move_tx, move_rx) = async_channel::bounded(self.settings.queue_capacity);

        let walker = {
            let source_dir = self.settings.source_dir.clone();
            let shutdown = self.shutdown.subscribe();
            let metrics = self.metrics.clone();
            task::spawn_blocking(move || run_walker(&source_dir, &file_tx, &shutdown, &metrics))
        };

        let resolvers: Vec<_> = (0..workers * 2)
            .map(|_| {
                let resolver = BatchResolver::new(
                    self.store.clone(),
                    folders.clone(),
                    self.settings.batch_size,
                    self.metrics.clone(),
                );
                let files = file_rx.clone();
                let moves = move_tx.clone();
                let shutdown = self.shutdown.subscribe();
                tokio::spawn(async move { resolver.run(files, moves, shutdown).await })
            })
            .collect();
        // The resolvers hold the only remaining move senders; dropping ours
        // lets closure reach the movers once the resolvers finish.
        drop(move_tx);
        drop(file_rx);

        let movers: Vec<_> = (0..workers)
            .map(|_| {
                let moves = move_rx.clone();
                let shutdown = self.shutdown.subscribe();
                let metrics = self.metrics.clone();
                task::spawn_blocking(move || run_mover(&moves, &shutdown, &metrics))
            })
            .collect();
        drop(move_rx);

        let files_enqueued = match walker.await.map_err(join_error("walker"))? {
            Ok(count) => count,
            Err(err) => {
                tracing::error!(error = %err, "directory traversal failed, ingestion stopped");
                self.metrics.snapshot().files_enqueued_total
            }
        };
        for handle in resolvers {
            handle.await.map_err(join_error("resolver"))??;
        }
        let mut files_moved = 0_u64;
        for handle in movers {
            files_moved += handle.await.map_err(join_error("mover"))?;
        }

        tracing::info!(files_enqueued, files_moved, "pipeline run complete");
        Ok(PipelineReport {
            files_enqueued,
            files_moved,
        })
    }
}
