//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use spoolhub_core::types::JobId;
use spoolhub_entity::job::{PaperSize, PrintJob, PrintSettings};
use spoolhub_printer::VirtualPrinter;
use spoolhub_render::SimpleTextRenderer;
use spoolhub_spooler::JobStore;
use spoolhub_worker::{SpoolerWorker, WorkerRunner};

/// A spooler wired the way the server wires it, rooted in a temp directory.
pub struct TestSpooler {
    /// Holds the spool, output and input directories
    pub dir: tempfile::TempDir,
    pub store: Arc<JobStore>,
    pub printer: Arc<VirtualPrinter>,
    pub worker: Arc<SpoolerWorker>,
}

impl TestSpooler {
    /// Create a spooler over fresh directories
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        Self::open(dir).await
    }

    /// Open a spooler over existing directories
    pub async fn open(dir: tempfile::TempDir) -> Self {
        let store = Arc::new(
            JobStore::open(dir.path().join("spool"))
                .await
                .expect("Failed to open job store"),
        );
        let printer = Arc::new(VirtualPrinter::new(dir.path().join("output")));
        let worker = Arc::new(SpoolerWorker::new(
            Arc::clone(&store),
            Arc::clone(&printer),
            Arc::new(SimpleTextRenderer::default()),
        ));
        Self {
            dir,
            store,
            printer,
            worker,
        }
    }

    /// Simulate a process restart over the same directories
    pub async fn restart(self) -> Self {
        let Self { dir, .. } = self;
        Self::open(dir).await
    }

    pub fn runner(&self) -> WorkerRunner {
        WorkerRunner::new(Arc::clone(&self.worker), &Default::default())
    }

    /// A second store over the same spool root, as a CLI invocation opens
    pub async fn operator_store(&self) -> JobStore {
        JobStore::open(self.spool_root())
            .await
            .expect("Failed to open operator store")
    }

    pub fn spool_root(&self) -> PathBuf {
        self.dir.path().join("spool")
    }

    /// Write an input file outside the spool
    pub fn write_source(&self, name: &str, contents: &str) -> PathBuf {
        let inbox = self.dir.path().join("inbox");
        std::fs::create_dir_all(&inbox).expect("Failed to create inbox");
        let path = inbox.join(name);
        std::fs::write(&path, contents).expect("Failed to write source");
        path
    }

    /// Submit a job over `paths` without spooling them
    pub async fn submit_paths(&self, paths: Vec<PathBuf>, settings: PrintSettings) -> PrintJob {
        let job = PrintJob::new("test document", "tester", settings, paths);
        self.store.submit(job.clone()).await.expect("Failed to submit");
        job
    }

    /// Spool `sources` and submit them as one job, the way the CLI does
    pub async fn submit_spooled<P: AsRef<Path>>(
        &self,
        sources: &[P],
        settings: PrintSettings,
    ) -> PrintJob {
        let id = JobId::new();
        let mut spooled = Vec::new();
        for source in sources {
            spooled.push(
                self.store
                    .spool_source(&id, source.as_ref())
                    .await
                    .expect("Failed to spool"),
            );
        }
        let job = PrintJob::with_id(id, "spooled document", "tester", settings, spooled);
        self.store.submit(job.clone()).await.expect("Failed to submit");
        job
    }

    pub async fn step(&self) -> bool {
        self.worker.process_one_step().await
    }

    /// Names of the persisted page images of a job
    pub fn page_names(&self, id: &JobId) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.printer.pages_dir(id))
            .map(|entries| {
                entries
                    .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

/// Small, fast pages: A5 at 72 DPI holds 32 lines.
pub fn small_settings() -> PrintSettings {
    PrintSettings {
        paper: PaperSize::A5,
        dpi: 72,
        ..PrintSettings::default()
    }
}

/// `n` numbered lines of text
pub fn numbered_lines(n: usize) -> String {
    (1..=n).map(|i| format!("Line {i}\n")).collect()
}
