//! In-memory metadata store used as a test double.
//!
//! Enforces the same full-path uniqueness contract as the Postgres
//! implementation so conflict handling can be exercised without a database.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::MetadataStore;
use crate::error::{StoreError, StoreResult};
use crate::model::{DocumentRecord, DocumentRow, FolderNode};

/// Mutex-guarded map store with the same contracts as [`crate::PgStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    folders: Mutex<HashMap<String, FolderNode>>,
    documents: Mutex<HashMap<String, DocumentRecord>>,
    rows: Mutex<HashMap<String, DocumentRow>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a classification row returned by the batched lookup.
    pub fn seed_lookup_row(&self, row: DocumentRow) {
        lock(&self.rows).insert(row.external_id.clone(), row);
    }

    /// Seed a document record addressable by its external identifier.
    pub fn seed_document(&self, record: DocumentRecord) {
        lock(&self.documents).insert(record.external_id.clone(), record);
    }

    /// Number of folder nodes currently held.
    #[must_use]
    pub fn folder_count(&self) -> usize {
        lock(&self.folders).len()
    }

    /// Fetch a folder node by full path without going through the trait.
    #[must_use]
    pub fn folder_by_path(&self, full_path: &str) -> Option<FolderNode> {
        lock(&self.folders).get(full_path).cloned()
    }

    /// Fetch a document record by external identifier without going through
    /// the trait.
    #[must_use]
    pub fn document(&self, external_id: &str) -> Option<DocumentRecord> {
        lock(&self.documents).get(external_id).cloned()
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn batch_lookup_by_external_ids(
        &self,
        ids: &[String],
    ) -> StoreResult<Vec<DocumentRow>> {
        let rows = lock(&self.rows);
        Ok(ids.iter().filter_map(|id| rows.get(id).cloned()).collect())
    }

    async fn find_folder_by_full_path(&self, full_path: &str) -> StoreResult<Option<FolderNode>> {
        Ok(lock(&self.folders).get(full_path).cloned())
    }

    async fn find_folder_by_name_and_parent_ref(
        &self,
        name: &str,
        parent_ref: &str,
    ) -> StoreResult<Option<FolderNode>> {
        Ok(lock(&self.folders)
            .values()
            .find(|node| node.name == name && node.parent_ref.as_deref() == Some(parent_ref))
            .cloned())
    }

    async fn create_folder(&self, node: &FolderNode) -> StoreResult<FolderNode> {
        let mut folders = lock(&self.folders);
        if folders.contains_key(&node.full_path) {
            return Err(StoreError::FolderExists {
                full_path: node.full_path.clone(),
            });
        }
        folders.insert(node.full_path.clone(), node.clone());
        Ok(node.clone())
    }

    async fn save_folder(&self, node: &FolderNode) -> StoreResult<()> {
        let mut folders = lock(&self.folders);
        folders.retain(|_, existing| existing.id != node.id);
        folders.insert(node.full_path.clone(), node.clone());
        Ok(())
    }

    async fn find_document_by_external_id(
        &self,
        external_id: &str,
    ) -> StoreResult<Option<DocumentRecord>> {
        Ok(lock(&self.documents).get(external_id).cloned())
    }

    async fn save_document(&self, record: &DocumentRecord) -> StoreResult<()> {
        lock(&self.documents).insert(record.external_id.clone(), record.clone());
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::model::SubjectKind;

    fn node(name: &str, full_path: &str) -> FolderNode {
        FolderNode {
            id: Uuid::new_v4(),
            name: name.to_string(),
            full_path: full_path.to_string(),
            external_ref: None,
            parent_ref: None,
            subject: Some(SubjectKind::DocumentType),
            subject_id: Some(7),
        }
    }

    #[tokio::test]
    async fn create_folder_rejects_duplicate_paths() -> StoreResult<()> {
        let store = MemoryStore::new();
        let first = node("HR_Docs", "/base/HR_Docs");
        store.create_folder(&first).await?;

        let second = node("HR_Docs", "/base/HR_Docs");
        let err = store
            .create_folder(&second)
            .await
            .expect_err("duplicate full path must conflict");
        assert!(matches!(err, StoreError::FolderExists { .. }));
        assert_eq!(store.folder_count(), 1);

        let winner = store
            .find_folder_by_full_path("/base/HR_Docs")
            .await?
            .expect("winner visible after conflict");
        assert_eq!(winner.id, first.id);
        Ok(())
    }

    #[tokio::test]
    async fn save_folder_updates_in_place() -> StoreResult<()> {
        let store = MemoryStore::new();
        let mut created = store.create_folder(&node("a", "/base/a")).await?;
        created.external_ref = Some(created.id.to_string());
        store.save_folder(&created).await?;

        let found = store
            .find_folder_by_full_path("/base/a")
            .await?
            .expect("node present");
        assert_eq!(found.external_ref, Some(created.id.to_string()));
        assert_eq!(store.folder_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn lookup_returns_only_seeded_rows() -> StoreResult<()> {
        let store = MemoryStore::new();
        store.seed_lookup_row(DocumentRow {
            external_id: "42".to_string(),
            doc_type: Some("HR Docs".to_string()),
            main_subject: Some("Payroll 2024".to_string()),
            sub_subject: None,
            type_id: Some(1),
            main_subject_id: Some(2),
            sub_subject_id: None,
            year: Some(2023),
        });

        let rows = store
            .batch_lookup_by_external_ids(&["42".to_string(), "99".to_string()])
            .await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].external_id, "42");
        Ok(())
    }
}
