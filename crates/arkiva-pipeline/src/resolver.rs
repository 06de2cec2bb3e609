//! Batched metadata resolution workers.
//!
//! # Design
//! - Each iteration blocks for one queue item, then opportunistically drains
//!   up to `batch_size - 1` more, so batch size is an upper bound and the
//!   pipeline never stalls waiting for a full batch.
//! - Failure isolation: a failed lookup drops its batch, a failed store
//!   write drops its row; the worker itself only exits when its queues
//!   close or shutdown is signalled.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;

use arkiva_store::{DocumentRow, FolderNode, MetadataStore};
use arkiva_telemetry::Metrics;
use async_channel::{Receiver, Sender};
use chrono::{Datelike, Local};
use tokio::sync::watch;

use crate::error::{PipelineError, PipelineResult};
use crate::folders::{Classification, FolderResolver};
use crate::mover::MoveTask;
use crate::paths::{original_name, path_segment, stored_file_name};
use crate::walker::SourceFile;

/// Worker turning queued files into persisted records and move tasks.
pub(crate) struct BatchResolver {
    store: Arc<dyn MetadataStore>,
    folders: Arc<FolderResolver>,
    batch_size: usize,
    metrics: Metrics,
}

impl BatchResolver {
    pub(crate) fn new(
        store: Arc<dyn MetadataStore>,
        folders: Arc<FolderResolver>,
        batch_size: usize,
        metrics: Metrics,
    ) -> Self {
        Self {
            store,
            folders,
            batch_size,
            metrics,
        }
    }

    /// Drain the file queue until it closes or shutdown is signalled.
    pub(crate) async fn run(
        &self,
        files: Receiver<SourceFile>,
        moves: Sender<MoveTask>,
        shutdown: watch::Receiver<bool>,
    ) -> PipelineResult<()> {
        loop {
            if *shutdown.borrow() {
                break;
            }
            let Ok(first) = files.recv().await else {
                break;
            };
            let mut batch = vec![first];
            while batch.len() < self.batch_size {
                let Ok(item) = files.try_recv() else {
                    break;
                };
                batch.push(item);
            }
            self.metrics
                .set_file_queue_depth(i64::try_from(files.len()).unwrap_or(i64::MAX));

            if self.process_batch(batch, &moves).await.is_break() {
                break;
            }
        }
        Ok(())
    }

    async fn process_batch(
        &self,
        batch: Vec<SourceFile>,
        moves: &Sender<MoveTask>,
    ) -> ControlFlow<()> {
        let tokens: Vec<String> = batch
            .iter()
            .filter_map(|item| item.token.clone())
            .collect();
        if tokens.is_empty() {
            tracing::debug!(size = batch.len(), "batch carries no identifier tokens");
            for _ in &batch {
                self.metrics.inc_lookup_failure();
            }
            return ControlFlow::Continue(());
        }

        let rows = match self.store.batch_lookup_by_external_ids(&tokens).await {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(
                    size = batch.len(),
                    error = %err,
                    "batched metadata lookup failed, dropping batch"
                );
                for _ in &batch {
                    self.metrics.inc_lookup_failure();
                }
                return ControlFlow::Continue(());
            }
        };
        self.metrics.inc_batch_processed();

        let mut destinations: HashMap<&str, (FolderNode, String)> =
            HashMap::with_capacity(rows.len());
        for row in &rows {
            match self.resolve_row(row).await {
                Ok(resolved) => {
                    destinations.insert(row.external_id.as_str(), resolved);
                }
                Err(err) => {
                    tracing::warn!(
                        external_id = %row.external_id,
                        error = %err,
                        "folder resolution failed, dropping row"
                    );
                }
            }
        }

        for item in batch {
            let Some(token) = item.token.clone() else {
                self.metrics.inc_lookup_failure();
                continue;
            };
            let Some((leaf, storage_dir)) = destinations.get(token.as_str()) else {
                self.metrics.inc_lookup_failure();
                tracing::debug!(file = %item.file_name, "no metadata record for token");
                continue;
            };
            if self
                .file_item(&item, &token, leaf, storage_dir, moves)
                .await
                .is_break()
            {
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Resolve one classification row to its leaf folder and the year-suffixed
    /// storage directory. The year never becomes a folder node; it exists in
    /// the path string only.
    async fn resolve_row(&self, row: &DocumentRow) -> PipelineResult<(FolderNode, String)> {
        let destination = format!(
            "{}/{}/{}",
            path_segment(row.doc_type.as_deref()),
            path_segment(row.main_subject.as_deref()),
            path_segment(row.sub_subject.as_deref()),
        );
        let classification = Classification {
            type_id: row.type_id,
            main_subject_id: row.main_subject_id,
            sub_subject_id: row.sub_subject_id,
        };
        let chain = self.folders.resolve(&destination, classification).await?;
        let leaf = chain
            .last()
            .cloned()
            .ok_or_else(|| PipelineError::FolderVanished {
                full_path: destination.clone(),
            })?;

        let year = row.year.unwrap_or_else(|| Local::now().year());
        let storage_dir = format!("{}/{year}", leaf.full_path);
        Ok((leaf, storage_dir))
    }

    async fn file_item(
        &self,
        item: &SourceFile,
        token: &str,
        leaf: &FolderNode,
        storage_dir: &str,
        moves: &Sender<MoveTask>,
    ) -> ControlFlow<()> {
        let mut record = match self.store.find_document_by_external_id(token).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.metrics.inc_lookup_failure();
                tracing::debug!(file = %item.file_name, "classification row without a document record");
                return ControlFlow::Continue(());
            }
            Err(err) => {
                tracing::warn!(
                    external_id = %token,
                    error = %err,
                    "document fetch failed, dropping file"
                );
                return ControlFlow::Continue(());
            }
        };

        let original = original_name(&item.file_name);
        let stored = stored_file_name(&original, &Local::now());
        record.folder_id = Some(leaf.id);
        record.storage_path = Some(storage_dir.to_string());
        record.stored_name = Some(stored.clone());
        record.original_name = Some(original);
        if let Err(err) = self.store.save_document(&record).await {
            tracing::warn!(
                external_id = %token,
                error = %err,
                "failed to persist document record, dropping file"
            );
            return ControlFlow::Continue(());
        }

        let task = MoveTask {
            source: item.path.clone(),
            destination: PathBuf::from(storage_dir).join(&stored),
        };
        if moves.send(task).await.is_err() {
            // Mover pool is gone; no point resolving further.
            return ControlFlow::Break(());
        }
        self.metrics
            .set_move_queue_depth(i64::try_from(moves.len()).unwrap_or(i64::MAX));
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use arkiva_store::{DocumentRecord, MemoryStore};
    use uuid::Uuid;

    use super::*;

    const BASE: &str = "/library/base";

    fn seed(store: &MemoryStore, external_id: &str, year: Option<i32>) -> Uuid {
        let record_id = Uuid::new_v4();
        store.seed_lookup_row(DocumentRow {
            external_id: external_id.to_string(),
            doc_type: Some("HR Docs".to_string()),
            main_subject: Some("Payroll 2024".to_string()),
            sub_subject: None,
            type_id: Some(1),
            main_subject_id: Some(2),
            sub_subject_id: None,
            year,
        });
        store.seed_document(DocumentRecord {
            id: record_id,
            external_id: external_id.to_string(),
            type_id: Some(1),
            main_subject_id: Some(2),
            sub_subject_id: None,
            storage_path: None,
            stored_name: None,
            original_name: None,
            folder_id: None,
        });
        record_id
    }

    fn source_file(name: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from("/staging").join(name),
            file_name: name.to_string(),
            token: crate::paths::extract_token(name),
        }
    }

    #[tokio::test]
    async fn tokenless_batch_is_skipped_without_stopping_the_worker() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "7", Some(2023));
        let metrics = Metrics::new()?;
        let folders = Arc::new(FolderResolver::new(
            store.clone(),
            BASE.to_string(),
            metrics.clone(),
        ));
        // Batch size 1 forces the tokenless item into its own batch.
        let resolver = BatchResolver::new(store.clone(), folders, 1, metrics.clone());

        let (file_tx, file_rx) = async_channel::bounded(4);
        let (move_tx, move_rx) = async_channel::bounded(4);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        file_tx.send(source_file("-orphan.pdf")).await?;
        file_tx.send(source_file("7-memo.txt")).await?;
        drop(file_tx);

        resolver.run(file_rx, move_tx, shutdown_rx).await?;

        let task = move_rx.try_recv()?;
        assert_eq!(task.source, PathBuf::from("/staging/7-memo.txt"));
        assert!(move_rx.try_recv().is_err(), "only one move expected");
        assert_eq!(metrics.snapshot().lookup_failures_total, 1);
        assert_eq!(metrics.snapshot().batches_processed_total, 1);
        Ok(())
    }

    #[tokio::test]
    async fn missing_dates_fall_back_to_the_current_calendar_year() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "9", None);
        let metrics = Metrics::new()?;
        let folders = Arc::new(FolderResolver::new(
            store.clone(),
            BASE.to_string(),
            metrics.clone(),
        ));
        let resolver = BatchResolver::new(store.clone(), folders, 100, metrics);

        let (file_tx, file_rx) = async_channel::bounded(4);
        let (move_tx, move_rx) = async_channel::bounded(4);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        file_tx.send(source_file("9-ledger.pdf")).await?;
        drop(file_tx);
        resolver.run(file_rx, move_tx, shutdown_rx).await?;

        let record = store.document("9").expect("record saved");
        let expected = format!(
            "/library/base/HR_Docs/Payroll_2024/_/{}",
            Local::now().year()
        );
        assert_eq!(record.storage_path.as_deref(), Some(expected.as_str()));

        let task = move_rx.try_recv()?;
        assert!(task.destination.starts_with(&expected));
        Ok(())
    }

    #[tokio::test]
    async fn resolved_records_carry_path_name_and_folder() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new());
        let record_id = seed(&store, "42", Some(2023));
        let metrics = Metrics::new()?;
        let folders = Arc::new(FolderResolver::new(
            store.clone(),
            BASE.to_string(),
            metrics.clone(),
        ));
        let resolver = BatchResolver::new(store.clone(), folders, 100, metrics);

        let (file_tx, file_rx) = async_channel::bounded(4);
        let (move_tx, move_rx) = async_channel::bounded(4);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        file_tx.send(source_file("42-report.pdf")).await?;
        drop(file_tx);
        resolver.run(file_rx, move_tx, shutdown_rx).await?;

        let record = store.document("42").expect("record saved");
        assert_eq!(record.id, record_id);
        assert_eq!(
            record.storage_path.as_deref(),
            Some("/library/base/HR_Docs/Payroll_2024/_/2023")
        );
        assert_eq!(record.original_name.as_deref(), Some("report.pdf"));
        let stored = record.stored_name.expect("stored name set");
        assert!(stored.ends_with("-report.pdf"));
        assert_eq!(stored.len(), "report.pdf".len() + 15);

        let leaf = store
            .folder_by_path("/library/base/HR_Docs/Payroll_2024/_")
            .expect("leaf created");
        assert_eq!(record.folder_id, Some(leaf.id));

        let task = move_rx.try_recv()?;
        assert_eq!(
            task.destination,
            PathBuf::from("/library/base/HR_Docs/Payroll_2024/_/2023").join(stored)
        );
        Ok(())
    }
}
