//! Integration tests for durability: records survive restarts, damage is
//! contained, and interrupted work resumes.

mod helpers;

use spoolhub_entity::job::{JobStatus, PrintJob};

use helpers::{TestSpooler, numbered_lines, small_settings};

#[tokio::test]
async fn test_jobs_survive_restart_unchanged() {
    let spooler = TestSpooler::new().await;
    let source = spooler.write_source("a.txt", &numbered_lines(5));

    let queued = spooler.submit_spooled(&[&source], small_settings()).await;
    let failed = spooler
        .submit_paths(vec![spooler.dir.path().join("missing.txt")], small_settings())
        .await;
    // Renders `queued`, then fails `failed`.
    spooler.step().await;
    spooler.step().await;

    let before: Vec<PrintJob> = spooler.store.list_jobs();
    assert_eq!(before.len(), 2);

    let spooler = spooler.restart().await;
    assert_eq!(spooler.store.list_jobs(), before);
    assert_eq!(
        spooler.store.status_of(&queued.id),
        Some(JobStatus::Previewing)
    );
    let failed = spooler.store.get(&failed.id).unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(failed.error_log.len(), 1);
}

#[tokio::test]
async fn test_corrupt_and_partial_records_are_skipped() {
    let spooler = TestSpooler::new().await;
    let source = spooler.write_source("a.txt", "a");
    let good = spooler.submit_spooled(&[&source], small_settings()).await;

    let root = spooler.spool_root();
    std::fs::write(root.join("0b7e0e6c-0000-4000-8000-000000000000.json"), "{\"id\": 12").unwrap();
    std::fs::write(root.join(format!("{}.json.tmp", good.id)), "{ trunc").unwrap();
    std::fs::write(root.join("notes.txt"), "not a record").unwrap();

    let spooler = spooler.restart().await;
    let jobs = spooler.store.list_jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0], good);
    assert!(!root.join(format!("{}.json.tmp", good.id)).exists());
}

#[tokio::test]
async fn test_confirmed_job_is_printed_after_restart() {
    let spooler = TestSpooler::new().await;
    let source = spooler.write_source("a.txt", &numbered_lines(40));
    let job = spooler.submit_spooled(&[&source], small_settings()).await;
    spooler.step().await;
    spooler.store.confirm_print(&job.id).await.unwrap();

    let spooler = spooler.restart().await;
    assert_eq!(spooler.store.status_of(&job.id), Some(JobStatus::Printing));

    assert!(spooler.step().await);
    assert_eq!(spooler.store.status_of(&job.id), Some(JobStatus::Completed));
    let doc = lopdf::Document::load(spooler.printer.output_path(&job.id)).expect("valid pdf");
    assert_eq!(doc.get_pages().len(), 2);
}

#[tokio::test]
async fn test_spooled_copy_outlives_original_file() {
    let spooler = TestSpooler::new().await;
    let source = spooler.write_source("draft.txt", "keep me");
    let job = spooler.submit_spooled(&[&source], small_settings()).await;
    std::fs::remove_file(&source).unwrap();

    let spooler = spooler.restart().await;
    let source_dir = std::fs::canonicalize(spooler.store.source_dir(&job.id)).unwrap();
    assert!(job.source_paths[0].starts_with(source_dir));

    spooler.step().await;
    assert_eq!(spooler.store.status_of(&job.id), Some(JobStatus::Previewing));
    assert_eq!(spooler.page_names(&job.id), ["page_0001.png"]);
}

#[tokio::test]
async fn test_persisted_record_uses_external_format() {
    let spooler = TestSpooler::new().await;
    let source = spooler.write_source("a.txt", "a");
    let job = spooler.submit_spooled(&[&source], small_settings()).await;

    let path = spooler.spool_root().join(format!("{}.json", job.id));
    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

    assert_eq!(record["id"], job.id.to_string());
    assert_eq!(record["user"], "tester");
    assert_eq!(record["status"], "QUEUED");
    assert_eq!(record["settings"]["paper"], "A5");
    assert_eq!(record["settings"]["isColor"], true);
    assert!(record["sourcePaths"].is_array());
    assert!(record["errorLog"].as_array().unwrap().is_empty());
}
