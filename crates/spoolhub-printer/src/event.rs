//! Page notifications broadcast to live subscribers.

use std::sync::Arc;

use image::RgbaImage;

use spoolhub_entity::job::PrintJob;

/// A rendered page was persisted for `job`.
#[derive(Debug, Clone)]
pub struct PageAccepted {
    /// Snapshot of the job at the time the page was accepted.
    pub job: PrintJob,
    /// The page raster, shared between all subscribers.
    pub image: Arc<RgbaImage>,
    /// 1-based page number within the job.
    pub page_number: u32,
}
