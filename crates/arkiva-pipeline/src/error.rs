//! # Design
//!
//! - Structured, constant-message errors with an operation tag so stage
//!   failures are attributable without string parsing.
//! - Stage isolation lives in the workers, not here: a variant reaching the
//!   engine means the whole stage gave up, not a single dropped item.

use std::io;
use std::path::{Path, PathBuf};

use arkiva_store::StoreError;
use thiserror::Error;

/// Result alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised by the relocation pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Enumerating the staging directory failed.
    #[error("directory traversal failed")]
    Traversal {
        /// Path the traversal was rooted at or stumbled over.
        path: PathBuf,
        /// Underlying walkdir error.
        #[source]
        source: walkdir::Error,
    },
    /// A metadata-store operation failed.
    #[error("metadata store operation failed")]
    Store {
        /// Operation tag identifying the failing call.
        operation: &'static str,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
    /// A filesystem operation on a move task failed.
    #[error("file relocation failed")]
    Move {
        /// Operation tag identifying the failing step.
        operation: &'static str,
        /// Path the step was acting on.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Joining a pipeline worker task failed.
    #[error("pipeline worker task failed")]
    Join {
        /// Worker role that failed to join.
        task: &'static str,
        /// Underlying join error.
        #[source]
        source: tokio::task::JoinError,
    },
    /// A folder reported as existing could not be found on re-lookup.
    #[error("folder vanished between conflict and re-lookup")]
    FolderVanished {
        /// Full path of the missing folder.
        full_path: String,
    },
}

pub(crate) fn store_error(operation: &'static str) -> impl FnOnce(StoreError) -> PipelineError {
    move |source| PipelineError::Store { operation, source }
}

pub(crate) fn move_error(
    operation: &'static str,
    path: &Path,
) -> impl FnOnce(io::Error) -> PipelineError {
    let path = path.to_path_buf();
    move |source| PipelineError::Move {
        operation,
        path,
        source,
    }
}

pub(crate) fn join_error(
    task: &'static str,
) -> impl FnOnce(tokio::task::JoinError) -> PipelineError {
    move |source| PipelineError::Join { task, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_render_constant_messages() {
        let vanished = PipelineError::FolderVanished {
            full_path: "/base/a".to_string(),
        };
        assert_eq!(
            vanished.to_string(),
            "folder vanished between conflict and re-lookup"
        );

        let moved = move_error("rename", Path::new("/staging/42-report.pdf"))(io::Error::other(
            "disk detached",
        ));
        assert_eq!(moved.to_string(), "file relocation failed");
        assert!(matches!(
            moved,
            PipelineError::Move {
                operation: "rename",
                ..
            }
        ));
    }
}
