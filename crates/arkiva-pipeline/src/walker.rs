//! Staging-directory enumeration feeding the file queue.
//!
//! Runs on a blocking thread: directory iteration and the backpressured
//! `send_blocking` are both synchronous. Dropping the sender on exit is the
//! end-of-ingestion signal for the resolver pool.

use std::path::{Path, PathBuf};

use arkiva_telemetry::Metrics;
use async_channel::Sender;
use tokio::sync::watch;
use walkdir::WalkDir;

use crate::error::{PipelineError, PipelineResult};
use crate::paths::extract_token;

/// Interval between walker progress log lines, in enqueued files.
const PROGRESS_LOG_EVERY: u64 = 1000;

/// A staged file queued for metadata resolution.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path of the staged file.
    pub path: PathBuf,
    /// File name, lossily decoded.
    pub file_name: String,
    /// Identifier token extracted from the file name, when one exists.
    pub token: Option<String>,
}

/// Enumerate regular files under `source_dir` and push them onto the file
/// queue, blocking when the queue is full. Returns the number of files
/// enqueued.
///
/// # Errors
///
/// Returns an error when the traversal itself fails; ingestion stops but
/// already-enqueued files continue through the pipeline.
pub(crate) fn run_walker(
    source_dir: &Path,
    queue: &Sender<SourceFile>,
    shutdown: &watch::Receiver<bool>,
    metrics: &Metrics,
) -> PipelineResult<u64> {
    let mut enqueued = 0_u64;
    for entry in WalkDir::new(source_dir) {
        if *shutdown.borrow() {
            tracing::info!(enqueued, "walker stopping on shutdown signal");
            break;
        }
        let entry = entry.map_err(|source| PipelineError::Traversal {
            path: source
                .path()
                .map_or_else(|| source_dir.to_path_buf(), Path::to_path_buf),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();
        let token = extract_token(&file_name);
        if token.is_none() {
            tracing::debug!(file = %file_name, "no identifier token in file name");
        }
        let item = SourceFile {
            path: entry.path().to_path_buf(),
            file_name,
            token,
        };
        if queue.send_blocking(item).is_err() {
            // All resolvers are gone; nothing downstream to feed.
            break;
        }
        enqueued = metrics.inc_file_enqueued();
        metrics.set_file_queue_depth(i64::try_from(queue.len()).unwrap_or(i64::MAX));
        if enqueued.is_multiple_of(PROGRESS_LOG_EVERY) {
            tracing::info!(enqueued, "walker progress");
        }
    }
    Ok(enqueued)
}
