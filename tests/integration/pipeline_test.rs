//! Integration tests for the print pipeline: submit, preview, confirm, print.

mod helpers;

use chrono::{Duration, Utc};
use lopdf::{Document, Object};

use spoolhub_entity::job::{JobStatus, PaperSize, PrintJob, PrintSettings};
use spoolhub_printer::FinalizeOutcome;

use helpers::{TestSpooler, numbered_lines, small_settings};

fn media_boxes(doc: &Document) -> Vec<Vec<f32>> {
    doc.get_pages()
        .values()
        .map(|page_id| {
            doc.get_object(*page_id)
                .and_then(Object::as_dict)
                .and_then(|page| page.get(b"MediaBox"))
                .and_then(Object::as_array)
                .expect("page has a media box")
                .iter()
                .map(|v| v.as_float().expect("numeric media box"))
                .collect()
        })
        .collect()
}

#[tokio::test]
async fn test_missing_source_fails_without_preview() {
    let spooler = TestSpooler::new().await;
    let mut events = spooler.printer.subscribe();
    let missing = spooler.dir.path().join("does-not-exist.txt");
    let job = spooler.submit_paths(vec![missing], small_settings()).await;

    assert!(spooler.step().await);

    let job = spooler.store.get(&job.id).expect("job exists");
    assert_eq!(job.status, JobStatus::Failed);
    assert!(!job.error_log.is_empty());
    assert!(job.error_log[0].contains("STORAGE: "), "{:?}", job.error_log);
    assert!(spooler.page_names(&job.id).is_empty());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_short_text_preview_confirm_print() {
    let spooler = TestSpooler::new().await;
    let source = spooler.write_source("note.txt", "Hello, printer.\nSecond line.\n");
    let settings = PrintSettings {
        paper: PaperSize::A4,
        dpi: 100,
        ..PrintSettings::default()
    };
    let job = spooler.submit_spooled(&[&source], settings).await;

    // Render stage.
    assert!(spooler.step().await);
    assert_eq!(spooler.store.status_of(&job.id), Some(JobStatus::Previewing));
    assert_eq!(spooler.page_names(&job.id), ["page_0001.png"]);

    let page = image::open(spooler.printer.pages_dir(&job.id).join("page_0001.png"))
        .expect("page decodes");
    assert_eq!((page.width(), page.height()), PaperSize::A4.pixel_size(100));

    // Nothing happens until a human confirms.
    assert!(!spooler.step().await);
    assert!(spooler.store.confirm_print(&job.id).await.unwrap());
    assert_eq!(spooler.store.status_of(&job.id), Some(JobStatus::Printing));

    // Finalize stage.
    assert!(spooler.step().await);
    assert_eq!(spooler.store.status_of(&job.id), Some(JobStatus::Completed));

    let doc = Document::load(spooler.printer.output_path(&job.id)).expect("valid pdf");
    let boxes = media_boxes(&doc);
    assert_eq!(boxes.len(), 1);
    let (width_px, height_px) = PaperSize::A4.pixel_size(100);
    assert!((boxes[0][2] - width_px as f32 * 0.72).abs() < 0.01);
    assert!((boxes[0][3] - height_px as f32 * 0.72).abs() < 0.01);
}

#[tokio::test]
async fn test_long_text_spans_pages_with_continuous_numbering() {
    let spooler = TestSpooler::new().await;
    let first = spooler.write_source("one.txt", &numbered_lines(70));
    let second = spooler.write_source("two.txt", &numbered_lines(10));
    let job = spooler
        .submit_spooled(&[&first, &second], small_settings())
        .await;
    let mut events = spooler.printer.subscribe();

    spooler.step().await;

    // 70 lines at 32 per page is 3 pages, then 1 more.
    assert_eq!(
        spooler.page_names(&job.id),
        [
            "page_0001.png",
            "page_0002.png",
            "page_0003.png",
            "page_0004.png"
        ]
    );
    let mut numbers = Vec::new();
    while let Ok(event) = events.try_recv() {
        assert_eq!(event.job.id, job.id);
        numbers.push(event.page_number);
    }
    assert_eq!(numbers, [1, 2, 3, 4]);

    spooler.store.confirm_print(&job.id).await.unwrap();
    spooler.step().await;
    let doc = Document::load(spooler.printer.output_path(&job.id)).expect("valid pdf");
    assert_eq!(doc.get_pages().len(), 4);
}

#[tokio::test]
async fn test_earliest_submitted_job_renders_first() {
    let spooler = TestSpooler::new().await;
    let source = spooler.write_source("a.txt", "a");
    let now = Utc::now();

    let mut b = PrintJob::new("B", "tester", small_settings(), vec![source.clone()]);
    b.submitted_at = now;
    let mut a = PrintJob::new("A", "tester", small_settings(), vec![source]);
    a.submitted_at = now - Duration::seconds(5);
    // Submitted out of order on purpose.
    spooler.store.submit(b.clone()).await.unwrap();
    spooler.store.submit(a.clone()).await.unwrap();

    spooler.step().await;
    assert_eq!(spooler.store.status_of(&a.id), Some(JobStatus::Previewing));
    assert_eq!(spooler.store.status_of(&b.id), Some(JobStatus::Queued));

    spooler.step().await;
    assert_eq!(spooler.store.status_of(&b.id), Some(JobStatus::Previewing));
}

#[tokio::test]
async fn test_cancelled_jobs_are_never_processed() {
    let spooler = TestSpooler::new().await;
    let source = spooler.write_source("a.txt", "a");

    let queued = spooler.submit_spooled(&[&source], small_settings()).await;
    assert!(spooler.store.cancel(&queued.id).await.unwrap());
    assert!(!spooler.step().await);
    assert!(spooler.page_names(&queued.id).is_empty());

    let printing = spooler.submit_spooled(&[&source], small_settings()).await;
    spooler.step().await;
    spooler.store.confirm_print(&printing.id).await.unwrap();
    assert!(spooler.store.cancel(&printing.id).await.unwrap());
    assert!(!spooler.step().await);
    assert_eq!(
        spooler.store.status_of(&printing.id),
        Some(JobStatus::Cancelled)
    );
    assert!(!spooler.printer.output_path(&printing.id).exists());
}

#[tokio::test]
async fn test_operator_actions_respect_the_state_machine() {
    let spooler = TestSpooler::new().await;
    let source = spooler.write_source("a.txt", "a");
    let job = spooler.submit_spooled(&[&source], small_settings()).await;

    // Queued: only cancel applies.
    assert!(!spooler.store.confirm_print(&job.id).await.unwrap());
    assert!(!spooler.store.retry(&job.id).await.unwrap());

    // Previewing: only confirm applies.
    spooler.step().await;
    assert!(!spooler.store.cancel(&job.id).await.unwrap());
    assert!(!spooler.store.retry(&job.id).await.unwrap());
    assert!(spooler.store.confirm_print(&job.id).await.unwrap());

    // Completed is terminal.
    spooler.step().await;
    assert_eq!(spooler.store.status_of(&job.id), Some(JobStatus::Completed));
    assert!(!spooler.store.cancel(&job.id).await.unwrap());
    assert!(!spooler.store.retry(&job.id).await.unwrap());
    assert!(!spooler.store.confirm_print(&job.id).await.unwrap());
}

#[tokio::test]
async fn test_failed_job_can_be_retried() {
    let spooler = TestSpooler::new().await;
    let source = spooler.dir.path().join("late.txt");
    let job = spooler
        .submit_paths(vec![source.clone()], small_settings())
        .await;

    spooler.step().await;
    assert_eq!(spooler.store.status_of(&job.id), Some(JobStatus::Failed));

    std::fs::write(&source, "now it exists").unwrap();
    assert!(spooler.store.retry(&job.id).await.unwrap());
    let retried = spooler.store.get(&job.id).unwrap();
    assert_eq!(retried.status, JobStatus::Queued);
    assert!(retried.error_log.is_empty());

    spooler.step().await;
    assert_eq!(spooler.store.status_of(&job.id), Some(JobStatus::Previewing));
    assert_eq!(spooler.page_names(&job.id), ["page_0001.png"]);
}

#[tokio::test]
async fn test_empty_document_completes_without_output() {
    let spooler = TestSpooler::new().await;
    let source = spooler.write_source("empty.txt", "");
    let job = spooler.submit_spooled(&[&source], small_settings()).await;

    spooler.step().await;
    assert_eq!(spooler.store.status_of(&job.id), Some(JobStatus::Previewing));
    assert!(spooler.page_names(&job.id).is_empty());

    let snapshot = spooler.store.get(&job.id).unwrap();
    assert_eq!(
        spooler.printer.finalize(&snapshot).await.unwrap(),
        FinalizeOutcome::NoPages
    );

    spooler.store.confirm_print(&job.id).await.unwrap();
    spooler.step().await;
    assert_eq!(spooler.store.status_of(&job.id), Some(JobStatus::Completed));
    assert!(!spooler.printer.output_path(&job.id).exists());
}

#[tokio::test]
async fn test_remove_deletes_everything() {
    let spooler = TestSpooler::new().await;
    let source = spooler.write_source("a.txt", &numbered_lines(3));
    let job = spooler.submit_spooled(&[&source], small_settings()).await;
    spooler.step().await;

    assert!(spooler.store.remove(&job.id).await.unwrap());
    assert!(spooler.printer.purge(&job.id).await.unwrap());

    assert!(spooler.store.get(&job.id).is_none());
    assert!(!spooler.store.source_dir(&job.id).exists());
    assert!(!spooler.printer.job_dir(&job.id).exists());
    assert!(!spooler.step().await);
}

#[tokio::test]
async fn test_run_until_idle_previews_every_queued_job() {
    let spooler = TestSpooler::new().await;
    let source = spooler.write_source("a.txt", "a");
    for _ in 0..3 {
        spooler.submit_spooled(&[&source], small_settings()).await;
    }

    assert_eq!(spooler.runner().run_until_idle().await, 3);
    assert!(
        spooler
            .store
            .list_jobs()
            .iter()
            .all(|job| job.status == JobStatus::Previewing)
    );
}

#[tokio::test]
async fn test_operator_confirm_from_another_process_is_printed() {
    let spooler = TestSpooler::new().await;
    let source = spooler.write_source("a.txt", &numbered_lines(3));
    let job = spooler.submit_spooled(&[&source], small_settings()).await;
    spooler.step().await;

    let operator = spooler.operator_store().await;
    assert!(operator.confirm_print(&job.id).await.unwrap());

    assert!(spooler.step().await);
    assert_eq!(spooler.store.status_of(&job.id), Some(JobStatus::Completed));
    assert!(spooler.printer.output_path(&job.id).exists());
}

#[tokio::test]
async fn test_operator_cancel_from_another_process_is_kept() {
    let spooler = TestSpooler::new().await;
    let source = spooler.write_source("a.txt", "a");
    let job = spooler.submit_spooled(&[&source], small_settings()).await;

    let operator = spooler.operator_store().await;
    assert!(operator.cancel(&job.id).await.unwrap());

    assert!(!spooler.step().await);
    assert!(spooler.page_names(&job.id).is_empty());
    let on_disk = spooler.operator_store().await;
    assert_eq!(on_disk.status_of(&job.id), Some(JobStatus::Cancelled));
}

#[tokio::test]
async fn test_unwritable_spool_lets_runner_go_idle() {
    let spooler = TestSpooler::new().await;
    let source = spooler.write_source("a.txt", "a");
    let job = spooler.submit_spooled(&[&source], small_settings()).await;
    std::fs::remove_dir_all(spooler.spool_root()).unwrap();

    let steps = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        spooler.runner().run_until_idle(),
    )
    .await
    .expect("runner kept spinning");
    assert_eq!(steps, 0);
    assert_eq!(spooler.store.status_of(&job.id), Some(JobStatus::Queued));
}

#[tokio::test]
async fn test_out_of_range_dpi_is_rejected_at_submit() {
    let spooler = TestSpooler::new().await;
    let source = spooler.write_source("a.txt", "a");
    let settings = PrintSettings {
        dpi: 20_000,
        ..PrintSettings::default()
    };
    let job = PrintJob::new("huge", "tester", settings, vec![source]);

    let err = spooler.store.submit(job).await.unwrap_err();
    assert_eq!(err.kind, spoolhub_core::error::ErrorKind::Validation);
    assert!(!spooler.step().await);
}
