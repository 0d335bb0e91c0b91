//! Print job entity model.

use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use spoolhub_core::types::JobId;

use super::settings::PrintSettings;
use super::status::JobStatus;

/// A submitted print request and its lifecycle state.
///
/// This is also the persisted record format: one pretty-printed JSON
/// document per job in the spool directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintJob {
    /// Unique job identifier.
    pub id: JobId,
    /// Display name of the submitted document.
    pub document_name: String,
    /// User who submitted the job.
    #[serde(rename = "user")]
    pub submitted_by: String,
    /// Rendering parameters.
    pub settings: PrintSettings,
    /// Current lifecycle status.
    pub status: JobStatus,
    /// Absolute paths of the input files, in print order.
    pub source_paths: Vec<PathBuf>,
    /// Submission time; the queue ordering key.
    pub submitted_at: DateTime<Utc>,
    /// `"<timestamp>: <message>"` entries, oldest first.
    #[serde(default)]
    pub error_log: Vec<String>,
}

impl PrintJob {
    /// Create a new queued job with a fresh id, stamped with the current time.
    pub fn new(
        document_name: impl Into<String>,
        submitted_by: impl Into<String>,
        settings: PrintSettings,
        source_paths: Vec<PathBuf>,
    ) -> Self {
        Self::with_id(
            JobId::new(),
            document_name,
            submitted_by,
            settings,
            source_paths,
        )
    }

    /// Create a new queued job with a pre-allocated id.
    ///
    /// Used when source files must be spooled under the job's id before
    /// the job itself exists.
    pub fn with_id(
        id: JobId,
        document_name: impl Into<String>,
        submitted_by: impl Into<String>,
        settings: PrintSettings,
        source_paths: Vec<PathBuf>,
    ) -> Self {
        Self {
            id,
            document_name: document_name.into(),
            submitted_by: submitted_by.into(),
            settings,
            status: JobStatus::Queued,
            source_paths,
            submitted_at: Utc::now(),
            error_log: Vec::new(),
        }
    }

    /// Append a timestamped entry to the error log.
    pub fn append_error(&mut self, message: impl AsRef<str>) {
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.error_log.push(format!("{stamp}: {}", message.as_ref()));
    }

    /// File name of this job's record inside the spool directory.
    pub fn record_file_name(&self) -> String {
        record_file_name(&self.id)
    }
}

/// File name of a job record inside the spool directory.
pub fn record_file_name(id: &JobId) -> String {
    format!("{id}.json")
}
