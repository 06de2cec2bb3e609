#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Concurrent file-relocation pipeline.
//!
//! Three stages connected by bounded queues: a walker enumerating the
//! staging directory, a pool of batch resolvers turning identifier tokens
//! into destination folders via the metadata store, and a pool of movers
//! performing the filesystem relocation. Stage completion propagates through
//! channel closure: the walker drops its sender when the walk ends, the
//! resolvers drain and exit, then the movers drain and exit.

pub mod engine;
pub mod error;
pub mod folders;
pub mod mover;
pub mod paths;
pub mod resolver;
pub mod walker;

pub use engine::{PipelineEngine, PipelineReport};
pub use error::{PipelineError, PipelineResult};
pub use folders::{Classification, FolderResolver};
pub use mover::MoveTask;
pub use walker::SourceFile;
