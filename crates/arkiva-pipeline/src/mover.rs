//! Blocking move workers draining the move queue.
//!
//! Relocation is rename-first with a copy-and-remove fallback so moves keep
//! working across filesystem boundaries. A failed task is logged, counted,
//! and dropped; the worker keeps draining.

use std::fs;
use std::path::{Path, PathBuf};

use arkiva_telemetry::Metrics;
use async_channel::Receiver;
use tokio::sync::watch;

use crate::error::{PipelineResult, move_error};

/// Interval between mover progress log lines, in relocated files.
const PROGRESS_LOG_EVERY: u64 = 1000;

/// A resolved relocation: move `source` to `destination`, overwriting.
#[derive(Debug, Clone)]
pub struct MoveTask {
    /// Staged file to relocate.
    pub source: PathBuf,
    /// Full destination path, stored name included.
    pub destination: PathBuf,
}

/// Drain the move queue until it closes, relocating one file per task.
/// Returns the number of files this worker moved.
pub(crate) fn run_mover(
    queue: &Receiver<MoveTask>,
    shutdown: &watch::Receiver<bool>,
    metrics: &Metrics,
) -> u64 {
    let mut moved = 0_u64;
    loop {
        if *shutdown.borrow() {
            tracing::info!(moved, "mover stopping on shutdown signal");
            break;
        }
        let Ok(task) = queue.recv_blocking() else {
            break;
        };
        metrics.set_move_queue_depth(i64::try_from(queue.len()).unwrap_or(i64::MAX));
        match move_file(&task.source, &task.destination) {
            Ok(()) => {
                moved += 1;
                let total = metrics.inc_file_moved();
                if total.is_multiple_of(PROGRESS_LOG_EVERY) {
                    tracing::info!(total, "mover progress");
                }
            }
            Err(err) => {
                metrics.inc_move_failure();
                tracing::warn!(
                    source = %task.source.display(),
                    destination = %task.destination.display(),
                    error = %err,
                    "failed to relocate file, dropping task"
                );
            }
        }
    }
    moved
}

/// Move a single file, creating the destination directory first. Falls back
/// to copy + remove when rename fails (typically a cross-device move).
pub(crate) fn move_file(source: &Path, destination: &Path) -> PipelineResult<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(move_error("create_dir_all", parent))?;
    }
    if fs::rename(source, destination).is_ok() {
        return Ok(());
    }
    fs::copy(source, destination).map_err(move_error("copy", destination))?;
    fs::remove_file(source).map_err(move_error("remove_source", source))?;
    Ok(())
}
