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

//! Metadata-store abstraction backing the Arkiva relocation pipeline.
//!
//! The pipeline only ever talks to the [`MetadataStore`] trait; `postgres`
//! carries the production implementation, `memory` the test double.

use async_trait::async_trait;

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use model::{DocumentRecord, DocumentRow, FolderNode, SubjectKind};
pub use postgres::PgStore;

/// Repository boundary between the pipeline and the metadata database.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Fetch classification rows for the given external identifiers in one
    /// round trip. Identifiers without a matching record are absent from the
    /// result.
    async fn batch_lookup_by_external_ids(
        &self,
        ids: &[String],
    ) -> StoreResult<Vec<DocumentRow>>;

    /// Look a folder node up by its full path.
    async fn find_folder_by_full_path(&self, full_path: &str) -> StoreResult<Option<FolderNode>>;

    /// Look a folder node up by its name and the external reference of its
    /// parent.
    async fn find_folder_by_name_and_parent_ref(
        &self,
        name: &str,
        parent_ref: &str,
    ) -> StoreResult<Option<FolderNode>>;

    /// Insert a folder node if no node with its full path exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::FolderExists`] when another node already holds
    /// the full path; the insert is atomic, so exactly one of any set of
    /// concurrent creators succeeds.
    async fn create_folder(&self, node: &FolderNode) -> StoreResult<FolderNode>;

    /// Persist updated fields of an existing folder node.
    async fn save_folder(&self, node: &FolderNode) -> StoreResult<()>;

    /// Look a document record up by its external identifier.
    async fn find_document_by_external_id(
        &self,
        external_id: &str,
    ) -> StoreResult<Option<DocumentRecord>>;

    /// Persist updated fields of an existing document record.
    async fn save_document(&self, record: &DocumentRecord) -> StoreResult<()>;
}
