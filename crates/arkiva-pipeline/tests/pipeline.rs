use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use arkiva_config::Settings;
use arkiva_pipeline::PipelineEngine;
use arkiva_store::{DocumentRecord, DocumentRow, MemoryStore};
use arkiva_telemetry::Metrics;
use tempfile::TempDir;
use uuid::Uuid;

fn settings(staging: &TempDir, library: &TempDir) -> Settings {
    Settings {
        source_dir: staging.path().to_path_buf(),
        library_root: library.path().to_path_buf(),
        batch_size: 100,
        queue_capacity: 64,
        database_url: "postgres://unused-in-tests".to_string(),
    }
}

fn seed_document(store: &MemoryStore, external_id: &str, year: Option<i32>) -> Uuid {
    let record_id = Uuid::new_v4();
    store.seed_lookup_row(DocumentRow {
        external_id: external_id.to_string(),
        doc_type: Some("HR Docs".to_string()),
        main_subject: Some("Payroll 2024".to_string()),
        sub_subject: None,
        type_id: Some(10),
        main_subject_id: Some(20),
        sub_subject_id: None,
        year,
    });
    store.seed_document(DocumentRecord {
        id: record_id,
        external_id: external_id.to_string(),
        type_id: Some(10),
        main_subject_id: Some(20),
        sub_subject_id: None,
        storage_path: None,
        stored_name: None,
        original_name: None,
        folder_id: None,
    });
    record_id
}

#[tokio::test(flavor = "multi_thread")]
async fn relocates_matched_files_and_records_their_destination() -> anyhow::Result<()> {
    let staging = TempDir::new()?;
    let library = TempDir::new()?;
    fs::write(staging.path().join("42-report.pdf"), b"annual report")?;
    // No metadata record for this token; the file must stay put.
    fs::write(staging.path().join("99-unknown.pdf"), b"unknown")?;

    let store = Arc::new(MemoryStore::new());
    seed_document(&store, "42", Some(2023));

    let metrics = Metrics::new()?;
    let engine = PipelineEngine::new(settings(&staging, &library), store.clone(), metrics.clone());
    let report = engine.run().await?;

    assert_eq!(report.files_enqueued, 2);
    assert_eq!(report.files_moved, 1);

    let base = library.path().to_string_lossy().into_owned();
    let leaf_path = format!("{base}/HR_Docs/Payroll_2024/_");
    let leaf = store.folder_by_path(&leaf_path).expect("leaf folder created");
    // Root, type, main subject, sub subject placeholder. The year is a path
    // component only, never a folder node.
    assert_eq!(store.folder_count(), 4);

    let record = store.document("42").expect("record present");
    assert_eq!(record.folder_id, Some(leaf.id));
    assert_eq!(record.storage_path.as_deref(), Some(format!("{leaf_path}/2023").as_str()));
    assert_eq!(record.original_name.as_deref(), Some("report.pdf"));
    let stored = record.stored_name.expect("stored name assigned");
    assert!(stored.ends_with("-report.pdf"));

    let destination = PathBuf::from(format!("{leaf_path}/2023")).join(&stored);
    assert_eq!(fs::read(&destination)?, b"annual report");
    assert!(!staging.path().join("42-report.pdf").exists());
    assert!(
        staging.path().join("99-unknown.pdf").exists(),
        "unmatched files are left in place"
    );

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.files_enqueued_total, 2);
    assert_eq!(snapshot.files_moved_total, 1);
    assert_eq!(snapshot.lookup_failures_total, 1);
    assert_eq!(snapshot.move_failures_total, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_staging_directory_produces_an_empty_report() -> anyhow::Result<()> {
    let staging = TempDir::new()?;
    let library = TempDir::new()?;
    let store = Arc::new(MemoryStore::new());

    let engine = PipelineEngine::new(
        settings(&staging, &library),
        store.clone(),
        Metrics::new()?,
    );
    let report = engine.run().await?;

    assert_eq!(report.files_enqueued, 0);
    assert_eq!(report.files_moved, 0);
    // The base root is still bootstrapped.
    assert_eq!(store.folder_count(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn resolution_is_shared_across_files_of_one_classification() -> anyhow::Result<()> {
    let staging = TempDir::new()?;
    let library = TempDir::new()?;
    for index in 0..20 {
        let external_id = format!("{index}");
        fs::write(
            staging.path().join(format!("{external_id}-doc.txt")),
            external_id.as_bytes(),
        )?;
    }

    let store = Arc::new(MemoryStore::new());
    for index in 0..20 {
        seed_document(&store, &format!("{index}"), Some(2022));
    }

    let engine = PipelineEngine::new(
        settings(&staging, &library),
        store.clone(),
        Metrics::new()?,
    );
    let report = engine.run().await?;

    assert_eq!(report.files_enqueued, 20);
    assert_eq!(report.files_moved, 20);
    // All twenty documents share one classification, so the tree still has
    // exactly one chain under the root.
    assert_eq!(store.folder_count(), 4);
    Ok(())
}
