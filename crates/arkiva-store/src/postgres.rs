//! Postgres-backed metadata store.
//!
//! # Design
//! - Const SQL strings, positional binds, explicit `try_get` decoding.
//! - Folder creation relies on `ON CONFLICT (full_path) DO NOTHING` so the
//!   insert-if-absent contract holds under concurrency without advisory
//!   locks.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::error::{StoreError, StoreResult, query_error};
use crate::model::{DocumentRecord, DocumentRow, FolderNode, SubjectKind};
use crate::MetadataStore;

/// Database-backed repository for folder nodes and document records.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

const BATCH_LOOKUP_SQL: &str = r"
    SELECT
        d.external_id,
        dt.name AS doc_type,
        ms.name AS main_subject,
        ss.name AS sub_subject,
        d.type_id,
        d.main_subject_id,
        d.sub_subject_id,
        EXTRACT(YEAR FROM COALESCE(d.doc_date, d.reg_date))::INT AS year
    FROM arkiva.documents d
    LEFT JOIN arkiva.document_types dt ON dt.id = d.type_id
    LEFT JOIN arkiva.main_subjects ms ON ms.id = d.main_subject_id
    LEFT JOIN arkiva.sub_subjects ss ON ss.id = d.sub_subject_id
    WHERE d.external_id = ANY($1)
";

const SELECT_FOLDER_BY_PATH_SQL: &str = r"
    SELECT id, name, full_path, external_ref, parent_ref, subject, subject_id
    FROM arkiva.folders
    WHERE full_path = $1
";

const SELECT_FOLDER_BY_NAME_AND_PARENT_SQL: &str = r"
    SELECT id, name, full_path, external_ref, parent_ref, subject, subject_id
    FROM arkiva.folders
    WHERE name = $1 AND parent_ref = $2
";

const INSERT_FOLDER_SQL: &str = r"
    INSERT INTO arkiva.folders (
        id,
        name,
        full_path,
        external_ref,
        parent_ref,
        subject,
        subject_id
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    ON CONFLICT (full_path) DO NOTHING
";

const UPDATE_FOLDER_SQL: &str = r"
    UPDATE arkiva.folders
    SET
        name = $2,
        full_path = $3,
        external_ref = $4,
        parent_ref = $5,
        subject = $6,
        subject_id = $7
    WHERE id = $1
";

const SELECT_DOCUMENT_SQL: &str = r"
    SELECT
        id,
        external_id,
        type_id,
        main_subject_id,
        sub_subject_id,
        storage_path,
        stored_name,
        original_name,
        folder_id
    FROM arkiva.documents
    WHERE external_id = $1
";

const UPDATE_DOCUMENT_SQL: &str = r"
    UPDATE arkiva.documents
    SET
        storage_path = $2,
        stored_name = $3,
        original_name = $4,
        folder_id = $5
    WHERE id = $1
";

impl PgStore {
    /// Initialise the store, applying pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if migrations fail or the database is unreachable.
    pub async fn new(pool: PgPool) -> StoreResult<Self> {
        let mut migrator = sqlx::migrate!("./migrations");
        migrator.set_ignore_missing(true);
        migrator
            .run(&pool)
            .await
            .map_err(|source| StoreError::Migrate { source })?;
        Ok(Self { pool })
    }

    /// Access the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for PgStore {
    async fn batch_lookup_by_external_ids(
        &self,
        ids: &[String],
    ) -> StoreResult<Vec<DocumentRow>> {
        let rows = sqlx::query(BATCH_LOOKUP_SQL)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("batch_lookup"))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(DocumentRow {
                external_id: get(&row, "external_id", "batch_lookup")?,
                doc_type: get(&row, "doc_type", "batch_lookup")?,
                main_subject: get(&row, "main_subject", "batch_lookup")?,
                sub_subject: get(&row, "sub_subject", "batch_lookup")?,
                type_id: get(&row, "type_id", "batch_lookup")?,
                main_subject_id: get(&row, "main_subject_id", "batch_lookup")?,
                sub_subject_id: get(&row, "sub_subject_id", "batch_lookup")?,
                year: get(&row, "year", "batch_lookup")?,
            });
        }
        Ok(out)
    }

    async fn find_folder_by_full_path(&self, full_path: &str) -> StoreResult<Option<FolderNode>> {
        sqlx::query(SELECT_FOLDER_BY_PATH_SQL)
            .bind(full_path)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error("find_folder_by_full_path"))?
            .map(|row| folder_from_row(&row, "find_folder_by_full_path"))
            .transpose()
    }

    async fn find_folder_by_name_and_parent_ref(
        &self,
        name: &str,
        parent_ref: &str,
    ) -> StoreResult<Option<FolderNode>> {
        sqlx::query(SELECT_FOLDER_BY_NAME_AND_PARENT_SQL)
            .bind(name)
            .bind(parent_ref)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error("find_folder_by_name_and_parent_ref"))?
            .map(|row| folder_from_row(&row, "find_folder_by_name_and_parent_ref"))
            .transpose()
    }

    async fn create_folder(&self, node: &FolderNode) -> StoreResult<FolderNode> {
        let result = sqlx::query(INSERT_FOLDER_SQL)
            .bind(node.id)
            .bind(&node.name)
            .bind(&node.full_path)
            .bind(node.external_ref.as_deref())
            .bind(node.parent_ref.as_deref())
            .bind(node.subject.map(SubjectKind::as_str))
            .bind(node.subject_id)
            .execute(&self.pool)
            .await
            .map_err(query_error("create_folder"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::FolderExists {
                full_path: node.full_path.clone(),
            });
        }
        Ok(node.clone())
    }

    async fn save_folder(&self, node: &FolderNode) -> StoreResult<()> {
        sqlx::query(UPDATE_FOLDER_SQL)
            .bind(node.id)
            .bind(&node.name)
            .bind(&node.full_path)
            .bind(node.external_ref.as_deref())
            .bind(node.parent_ref.as_deref())
            .bind(node.subject.map(SubjectKind::as_str))
            .bind(node.subject_id)
            .execute(&self.pool)
            .await
            .map_err(query_error("save_folder"))?;
        Ok(())
    }

    async fn find_document_by_external_id(
        &self,
        external_id: &str,
    ) -> StoreResult<Option<DocumentRecord>> {
        sqlx::query(SELECT_DOCUMENT_SQL)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error("find_document_by_external_id"))?
            .map(|row| document_from_row(&row, "find_document_by_external_id"))
            .transpose()
    }

    async fn save_document(&self, record: &DocumentRecord) -> StoreResult<()> {
        sqlx::query(UPDATE_DOCUMENT_SQL)
            .bind(record.id)
            .bind(record.storage_path.as_deref())
            .bind(record.stored_name.as_deref())
            .bind(record.original_name.as_deref())
            .bind(record.folder_id)
            .execute(&self.pool)
            .await
            .map_err(query_error("save_document"))?;
        Ok(())
    }
}

fn get<'r, T>(row: &'r PgRow, column: &str, operation: &'static str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column).map_err(query_error(operation))
}

fn folder_from_row(row: &PgRow, operation: &'static str) -> StoreResult<FolderNode> {
    let subject = get::<Option<String>>(row, "subject", operation)?.and_then(|label| {
        let kind = SubjectKind::from_label(&label);
        if kind.is_none() {
            tracing::warn!(subject = %label, "unknown folder subject label in metadata store");
        }
        kind
    });

    Ok(FolderNode {
        id: get(row, "id", operation)?,
        name: get(row, "name", operation)?,
        full_path: get(row, "full_path", operation)?,
        external_ref: get(row, "external_ref", operation)?,
        parent_ref: get(row, "parent_ref", operation)?,
        subject,
        subject_id: get(row, "subject_id", operation)?,
    })
}

fn document_from_row(row: &PgRow, operation: &'static str) -> StoreResult<DocumentRecord> {
    Ok(DocumentRecord {
        id: get(row, "id", operation)?,
        external_id: get(row, "external_id", operation)?,
        type_id: get(row, "type_id", operation)?,
        main_subject_id: get(row, "main_subject_id", operation)?,
        sub_subject_id: get(row, "sub_subject_id", operation)?,
        storage_path: get(row, "storage_path", operation)?,
        stored_name: get(row, "stored_name", operation)?,
        original_name: get(row, "original_name", operation)?,
        folder_id: get(row, "folder_id", operation)?,
    })
}
