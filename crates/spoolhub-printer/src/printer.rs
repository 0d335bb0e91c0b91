//! The virtual printer: page sink and document assembler.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};
use tokio::fs;
use tokio::sync::broadcast;

use spoolhub_core::config::OutputConfig;
use spoolhub_core::error::{AppError, ErrorKind};
use spoolhub_core::result::AppResult;
use spoolhub_core::types::JobId;
use spoolhub_entity::job::PrintJob;

use crate::event::PageAccepted;
use crate::pdf;

/// Capacity of the page notification channel.
const EVENT_CAPACITY: usize = 64;

const PAGES_DIR: &str = "rendered_pages";
const OUTPUT_FILE: &str = "output.pdf";

/// Result of compiling a job's pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// The job had no persisted pages; nothing was written.
    NoPages,
    /// A PDF with `pages` pages was written to `path`.
    Assembled { pages: u32, path: PathBuf },
}

/// Receives rendered pages for jobs and compiles them into PDFs.
///
/// Layout under the output root:
/// `<jobId>/rendered_pages/page_0001.png` and `<jobId>/output.pdf`.
#[derive(Debug, Clone)]
pub struct VirtualPrinter {
    output_root: PathBuf,
    events: broadcast::Sender<PageAccepted>,
}

impl VirtualPrinter {
    /// Create a printer writing under `output_root`.
    ///
    /// Directories are created on demand.
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            output_root: output_root.into(),
            events,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(&config.root)
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Directory holding everything produced for a job.
    pub fn job_dir(&self, job_id: &JobId) -> PathBuf {
        self.output_root.join(job_id.to_string())
    }

    /// Directory holding a job's page images.
    pub fn pages_dir(&self, job_id: &JobId) -> PathBuf {
        self.job_dir(job_id).join(PAGES_DIR)
    }

    /// Location of a job's compiled document.
    pub fn output_path(&self, job_id: &JobId) -> PathBuf {
        self.job_dir(job_id).join(OUTPUT_FILE)
    }

    /// Subscribe to page notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<PageAccepted> {
        self.events.subscribe()
    }

    /// Persist one rendered page and notify subscribers.
    ///
    /// Failures are logged and swallowed; a page that could not be written
    /// is not announced.
    pub async fn accept_page(&self, job: &PrintJob, image: RgbaImage, page_number: u32) {
        let image = Arc::new(image);
        let path = self.pages_dir(&job.id).join(page_file_name(page_number));

        if let Err(e) = self.write_page(&path, Arc::clone(&image)).await {
            tracing::error!(
                job_id = %job.id,
                page_number,
                path = %path.display(),
                error = %e,
                "Failed to persist rendered page"
            );
            return;
        }

        tracing::debug!(job_id = %job.id, page_number, "Accepted page");

        // No subscribers is fine.
        let _ = self.events.send(PageAccepted {
            job: job.clone(),
            image,
            page_number,
        });
    }

    async fn write_page(&self, path: &Path, image: Arc<RgbaImage>) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create pages directory: {}", parent.display()),
                    e,
                )
            })?;
        }

        let encoded = tokio::task::spawn_blocking(move || encode_png(&image))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "PNG encode task panicked", e))??;

        fs::write(path, &encoded).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write page: {}", path.display()),
                e,
            )
        })
    }

    /// Persisted page images of a job, in page order.
    ///
    /// Pages are ordered by the number in their file name, so `page_10000`
    /// follows `page_9999`. Other PNG files sort after every numbered page.
    /// A job without a pages directory has no pages.
    pub async fn rendered_pages(&self, job_id: &JobId) -> AppResult<Vec<PathBuf>> {
        let dir = self.pages_dir(job_id);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to list pages: {}", dir.display()),
                    e,
                ));
            }
        };

        let mut pages = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_png = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("png"))
                .unwrap_or(false);
            if is_png && entry.file_type().await?.is_file() {
                pages.push(path);
            }
        }
        pages.sort_by_cached_key(|path| {
            let number = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(parse_page_number)
                .unwrap_or(u32::MAX);
            (number, path.clone())
        });
        Ok(pages)
    }

    /// Compile a job's persisted pages into `output.pdf`.
    pub async fn finalize(&self, job: &PrintJob) -> AppResult<FinalizeOutcome> {
        let pages = self.rendered_pages(&job.id).await?;
        if pages.is_empty() {
            tracing::warn!(job_id = %job.id, "No rendered pages to finalize");
            return Ok(FinalizeOutcome::NoPages);
        }

        let output = self.output_path(&job.id);
        let settings = job.settings;
        let target = output.clone();
        let count = tokio::task::spawn_blocking(move || pdf::assemble(&pages, &settings, &target))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "PDF assembly task panicked", e))??;

        tracing::info!(
            job_id = %job.id,
            pages = count,
            path = %output.display(),
            "Assembled output document"
        );

        Ok(FinalizeOutcome::Assembled {
            pages: count,
            path: output,
        })
    }

    /// Delete everything produced for a job. Returns whether anything existed.
    pub async fn purge(&self, job_id: &JobId) -> AppResult<bool> {
        let dir = self.job_dir(job_id);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::debug!(job_id = %job_id, "Purged job output");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to purge job output: {}", dir.display()),
                e,
            )),
        }
    }
}

/// `page_0001.png` style file name for a 1-based page number.
pub fn page_file_name(page_number: u32) -> String {
    format!("page_{page_number:04}.png")
}

/// Page number encoded in a `page_0001.png` style file name.
pub fn parse_page_number(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix("page_")?
        .strip_suffix(".png")?
        .parse()
        .ok()
}

fn encode_png(image: &RgbaImage) -> AppResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| AppError::with_source(ErrorKind::Render, "Failed to encode page as PNG", e))?;
    Ok(buffer.into_inner())
}
