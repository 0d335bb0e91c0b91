//! The print pipeline: render queued jobs, finalize committed ones.

use std::sync::Arc;

use spoolhub_core::error::{AppError, ErrorKind};
use spoolhub_core::result::AppResult;
use spoolhub_entity::job::{JobStatus, PrintJob};
use spoolhub_printer::{FinalizeOutcome, VirtualPrinter};
use spoolhub_render::{PageRenderer, open_source};
use spoolhub_spooler::JobStore;

/// How a render pass ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderOutcome {
    /// Every page of every source was handed to the printer.
    Rendered { pages: u32 },
    /// The job left `Previewing` while pages were being produced.
    Interrupted { pages: u32 },
}

/// Drives jobs through the pipeline one stage at a time.
///
/// Committed (`Printing`) jobs are finalized before any new job is
/// rendered. Within a stage the earliest submitted job goes first.
#[derive(Debug)]
pub struct SpoolerWorker {
    store: Arc<JobStore>,
    printer: Arc<VirtualPrinter>,
    renderer: Arc<dyn PageRenderer>,
}

impl SpoolerWorker {
    pub fn new(
        store: Arc<JobStore>,
        printer: Arc<VirtualPrinter>,
        renderer: Arc<dyn PageRenderer>,
    ) -> Self {
        Self {
            store,
            printer,
            renderer,
        }
    }

    /// Advance one job by one stage. Returns `false` when there was nothing
    /// to do, or when the chosen job could not be advanced because its
    /// record could not be written; callers back off in both cases.
    ///
    /// Job errors are recorded on the job and never returned.
    pub async fn process_one_step(&self) -> bool {
        // Operators act through other processes; pick up their changes.
        if let Err(e) = self.store.refresh().await {
            tracing::warn!(error = %e, "Failed to refresh job index from disk");
        }

        if let Some(job) = self.store.next_with_status(JobStatus::Printing) {
            return self.finalize_job(job).await;
        }
        if let Some(job) = self.store.next_with_status(JobStatus::Queued) {
            return self.preview_job(job).await;
        }
        false
    }

    async fn finalize_job(&self, job: PrintJob) -> bool {
        let outcome = match self.printer.finalize(&job).await {
            Ok(outcome) => outcome,
            Err(e) => return self.fail(&job, e).await,
        };
        if outcome == FinalizeOutcome::NoPages {
            tracing::warn!(job_id = %job.id, "Completing job without output document");
        }

        match self
            .store
            .transition(&job.id, JobStatus::Printing, JobStatus::Completed)
            .await
        {
            Ok(Some(_)) => true,
            Ok(None) => {
                tracing::info!(
                    job_id = %job.id,
                    status = ?self.store.status_of(&job.id),
                    "Job changed during finalize, leaving it as is"
                );
                true
            }
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "Failed to complete job");
                false
            }
        }
    }

    async fn preview_job(&self, job: PrintJob) -> bool {
        let job = match self
            .store
            .transition(&job.id, JobStatus::Queued, JobStatus::Previewing)
            .await
        {
            Ok(Some(job)) => job,
            // Taken or changed elsewhere; the index now reflects it.
            Ok(None) => return true,
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "Failed to start preview");
                return false;
            }
        };

        match self.render_pages(&job).await {
            Ok(RenderOutcome::Rendered { pages }) => {
                tracing::info!(job_id = %job.id, pages, "Preview ready, awaiting confirmation");
            }
            Ok(RenderOutcome::Interrupted { pages }) => {
                tracing::info!(
                    job_id = %job.id,
                    pages,
                    status = ?self.store.status_of(&job.id),
                    "Preview interrupted"
                );
            }
            Err(e) => return self.fail(&job, e).await,
        }
        true
    }

    async fn render_pages(&self, job: &PrintJob) -> AppResult<RenderOutcome> {
        if job.source_paths.is_empty() {
            return Err(AppError::validation("Job has no source files"));
        }

        // A retried job starts from an empty page set.
        self.printer.purge(&job.id).await?;

        let mut page_number = 0u32;
        for path in &job.source_paths {
            let source = open_source(path)?;
            if !self.renderer.supports(source.content_type()) {
                return Err(AppError::unsupported_content(format!(
                    "No renderer for {} content: {}",
                    source.content_type(),
                    path.display()
                )));
            }

            let renderer = Arc::clone(&self.renderer);
            let settings = job.settings;
            let counted = Arc::clone(&source);
            let total =
                blocking(move || renderer.total_pages(counted.as_ref(), &settings)).await?;
            tracing::debug!(job_id = %job.id, path = %path.display(), total, "Paginated source");

            for index in 0..total {
                let current = self.store.sync_job(&job.id).await?;
                if current.map(|j| j.status) != Some(JobStatus::Previewing) {
                    return Ok(RenderOutcome::Interrupted { pages: page_number });
                }

                let renderer = Arc::clone(&self.renderer);
                let page_source = Arc::clone(&source);
                let image =
                    blocking(move || renderer.render(page_source.as_ref(), index, &settings))
                        .await?;

                page_number += 1;
                self.printer.accept_page(job, image, page_number).await;
            }
        }

        Ok(RenderOutcome::Rendered { pages: page_number })
    }

    /// Record `error` on the job. Returns whether the failure was persisted.
    async fn fail(&self, job: &PrintJob, error: AppError) -> bool {
        tracing::error!(job_id = %job.id, error = %error, "Job processing failed");
        match self.store.record_failure(&job.id, &error.to_string()).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "Failed to record job failure");
                false
            }
        }
    }
}

/// Run CPU-bound work on the blocking pool.
async fn blocking<T, F>(work: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Render task panicked", e))?
}
