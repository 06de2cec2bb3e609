//! Destination folder resolution and creation.
//!
//! # Design
//! - Every segment of a destination path is an independent get-or-create
//!   unit of work, so concurrent resolvers converge on one node per path.
//! - Creation losers adopt the winner: a uniqueness conflict from the store
//!   triggers a lookup-only retry and is never surfaced as a batch failure.

use std::sync::Arc;

use arkiva_store::{FolderNode, MetadataStore, StoreError, SubjectKind};
use arkiva_telemetry::Metrics;
use once_cell::sync::OnceCell;
use uuid::Uuid;

use crate::error::{PipelineError, PipelineResult, store_error};
use crate::paths::split_segments;

/// Classification identifiers attached to the tagged chain levels.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classification {
    /// Document type id, tagged onto the first level below the root.
    pub type_id: Option<i64>,
    /// Main subject id, tagged onto the second level.
    pub main_subject_id: Option<i64>,
    /// Sub subject id, tagged onto the third level.
    pub sub_subject_id: Option<i64>,
}

/// Resolves destination paths into chains of folder nodes, creating missing
/// segments on the way down.
pub struct FolderResolver {
    store: Arc<dyn MetadataStore>,
    base: String,
    metrics: Metrics,
    root: OnceCell<FolderNode>,
}

impl FolderResolver {
    /// Build a resolver rooted at the given base path.
    #[must_use]
    pub fn new(store: Arc<dyn MetadataStore>, base: String, metrics: Metrics) -> Self {
        Self {
            store,
            base,
            metrics,
            root: OnceCell::new(),
        }
    }

    /// Idempotently bootstrap the base-root node. The first caller creates
    /// it; everyone else gets the cached node.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or the root node cannot
    /// be created.
    pub async fn ensure_root(&self) -> PipelineResult<FolderNode> {
        if let Some(node) = self.root.get() {
            return Ok(node.clone());
        }
        let node = self.load_or_create_root().await?;
        Ok(self.root.get_or_init(|| node).clone())
    }

    /// Resolve a destination path into its chain of folder nodes, creating
    /// any missing segment. The returned chain excludes the root and is
    /// ordered top-down; the last element is the leaf a record is filed
    /// under.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails or a conflicting node
    /// cannot be re-read after a lost creation race.
    pub async fn resolve(
        &self,
        destination: &str,
        classification: Classification,
    ) -> PipelineResult<Vec<FolderNode>> {
        let root = self.ensure_root().await?;
        let relative = destination
            .strip_prefix(self.base.as_str())
            .unwrap_or(destination);
        let segments = split_segments(relative);

        let mut chain: Vec<FolderNode> = Vec::with_capacity(segments.len());
        let mut cumulative = self.base.clone();
        for (index, segment) in segments.iter().enumerate() {
            cumulative.push('/');
            cumulative.push_str(segment);
            let parent = self.parent_for(index, &segments, &chain, &root).await?;
            let node = self
                .get_or_create(
                    segment,
                    &cumulative,
                    &parent,
                    subject_for(index),
                    subject_id_for(index, classification),
                )
                .await?;
            chain.push(node);
        }
        Ok(chain)
    }

    async fn load_or_create_root(&self) -> PipelineResult<FolderNode> {
        if let Some(existing) = self
            .store
            .find_folder_by_full_path(&self.base)
            .await
            .map_err(store_error("find_folder_by_full_path"))?
        {
            return Ok(existing);
        }

        let name = split_segments(&self.base)
            .last()
            .map_or_else(|| self.base.clone(), ToString::to_string);
        let node = FolderNode {
            id: Uuid::new_v4(),
            name,
            full_path: self.base.clone(),
            external_ref: None,
            parent_ref: None,
            subject: Some(SubjectKind::Root),
            subject_id: None,
        };
        match self.store.create_folder(&node).await {
            Ok(mut created) => {
                created.external_ref = Some(created.id.to_string());
                self.store
                    .save_folder(&created)
                    .await
                    .map_err(store_error("save_folder"))?;
                tracing::info!(path = %created.full_path, "created base root folder");
                Ok(created)
            }
            Err(StoreError::FolderExists { .. }) => self.adopt_winner(&self.base).await,
            Err(err) => Err(store_error("create_folder")(err)),
        }
    }

    /// Resolve the parent of segment `index`: the root for the first
    /// segment, otherwise the previous segment looked up by name and the
    /// grandparent's reference, falling back to the in-flight chain.
    async fn parent_for(
        &self,
        index: usize,
        segments: &[&str],
        chain: &[FolderNode],
        root: &FolderNode,
    ) -> PipelineResult<FolderNode> {
        if index == 0 {
            return Ok(root.clone());
        }

        let grandparent_ref = if index == 1 {
            root.external_ref.clone()
        } else {
            chain.get(index - 2).and_then(|node| node.external_ref.clone())
        };
        if let Some(reference) = grandparent_ref {
            if let Some(found) = self
                .store
                .find_folder_by_name_and_parent_ref(segments[index - 1], &reference)
                .await
                .map_err(store_error("find_folder_by_name_and_parent_ref"))?
            {
                return Ok(found);
            }
        }
        chain
            .get(index - 1)
            .cloned()
            .ok_or_else(|| PipelineError::FolderVanished {
                full_path: segments[..index].join("/"),
            })
    }

    async fn get_or_create(
        &self,
        name: &str,
        full_path: &str,
        parent: &FolderNode,
        subject: Option<SubjectKind>,
        subject_id: Option<i64>,
    ) -> PipelineResult<FolderNode> {
        if let Some(found) = self
            .store
            .find_folder_by_full_path(full_path)
            .await
            .map_err(store_error("find_folder_by_full_path"))?
        {
            return Ok(found);
        }

        let node = FolderNode {
            id: Uuid::new_v4(),
            name: name.to_string(),
            full_path: full_path.to_string(),
            external_ref: None,
            parent_ref: parent.external_ref.clone(),
            subject,
            subject_id,
        };
        match self.store.create_folder(&node).await {
            Ok(mut created) => {
                created.external_ref = Some(created.id.to_string());
                self.store
                    .save_folder(&created)
                    .await
                    .map_err(store_error("save_folder"))?;
                Ok(created)
            }
            Err(StoreError::FolderExists { .. }) => {
                self.metrics.inc_folder_conflict();
                tracing::debug!(path = %full_path, "lost folder creation race, adopting winner");
                self.adopt_winner(full_path).await
            }
            Err(err) => Err(store_error("create_folder")(err)),
        }
    }

    async fn adopt_winner(&self, full_path: &str) -> PipelineResult<FolderNode> {
        self.store
            .find_folder_by_full_path(full_path)
            .await
            .map_err(store_error("find_folder_by_full_path"))?
            .ok_or_else(|| PipelineError::FolderVanished {
                full_path: full_path.to_string(),
            })
    }
}

const fn subject_for(index: usize) -> Option<SubjectKind> {
    match index {
        0 => Some(SubjectKind::DocumentType),
        1 => Some(SubjectKind::MainSubject),
        2 => Some(SubjectKind::SubSubject),
        _ => None,
    }
}

const fn subject_id_for(index: usize, classification: Classification) -> Option<i64> {
    match index {
        0 => classification.type_id,
        1 => classification.main_subject_id,
        2 => classification.sub_subject_id,
        _ => None,
    }
}
