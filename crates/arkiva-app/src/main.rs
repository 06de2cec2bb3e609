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

//! Binary entrypoint that wires the Arkiva relocation pipeline together.

use arkiva_app::{AppResult, run_app};

/// Bootstraps the pipeline and blocks until it drains or is interrupted.
#[tokio::main]
async fn main() -> AppResult<()> {
    run_app().await
}
