//! The job store.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use tokio::fs;
use tokio::sync::{Mutex, MutexGuard};

use spoolhub_core::config::SpoolConfig;
use spoolhub_core::error::{AppError, ErrorKind};
use spoolhub_core::result::AppResult;
use spoolhub_core::types::JobId;
use spoolhub_entity::job::{JobStatus, PrintJob};

use crate::lock::SpoolLock;
use crate::record;

/// Durable registry of all print jobs.
///
/// The records on disk are authoritative; the in-memory index is a cache
/// that readers get cloned snapshots from. Every mutation holds the
/// store's write lock and the cross-process [`SpoolLock`], re-reads the
/// job's record, then replaces and re-persists the whole record. Changes
/// written by another process are picked up by [`JobStore::refresh`] and
/// [`JobStore::sync_job`].
#[derive(Debug)]
pub struct JobStore {
    root: PathBuf,
    jobs: DashMap<JobId, PrintJob>,
    write_lock: Mutex<()>,
}

impl JobStore {
    /// Open the store rooted at `root`, loading every persisted record.
    pub async fn open(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create spool directory: {}", root.display()),
                e,
            )
        })?;

        let jobs = DashMap::new();
        {
            let _spool = SpoolLock::acquire(&root).await?;
            for job in record::load_records(&root).await? {
                jobs.insert(job.id, job);
            }
        }

        tracing::info!(root = %root.display(), jobs = jobs.len(), "Opened job store");

        Ok(Self {
            root,
            jobs,
            write_lock: Mutex::new(()),
        })
    }

    pub async fn from_config(config: &SpoolConfig) -> AppResult<Self> {
        Self::open(&config.root).await
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a job's spooled input files.
    pub fn source_dir(&self, id: &JobId) -> PathBuf {
        self.root.join(id.to_string())
    }

    /// Register a new job and persist it.
    pub async fn submit(&self, job: PrintJob) -> AppResult<()> {
        if job.status != JobStatus::Queued {
            return Err(AppError::validation(format!(
                "New jobs must be QUEUED, got {}",
                job.status
            )));
        }
        job.settings.ensure_valid()?;

        let _guard = self.lock().await?;
        if self.jobs.contains_key(&job.id) || record::read_job(&self.root, &job.id).await?.is_some()
        {
            return Err(AppError::conflict(format!("Job {} already exists", job.id)));
        }

        record::write_record(&self.root, &job).await?;
        tracing::info!(
            job_id = %job.id,
            document = %job.document_name,
            user = %job.submitted_by,
            "Submitted job"
        );
        self.jobs.insert(job.id, job);
        Ok(())
    }

    /// Replace a known job's record. Unknown ids are ignored.
    pub async fn update(&self, job: PrintJob) -> AppResult<bool> {
        let _guard = self.lock().await?;
        if record::read_job(&self.root, &job.id).await?.is_none() {
            self.jobs.remove(&job.id);
            tracing::warn!(job_id = %job.id, "Ignoring update for unknown job");
            return Ok(false);
        }

        record::write_record(&self.root, &job).await?;
        self.jobs.insert(job.id, job);
        Ok(true)
    }

    /// Snapshot of one job.
    pub fn get(&self, id: &JobId) -> Option<PrintJob> {
        self.jobs.get(id).map(|entry| entry.value().clone())
    }

    /// Current status of a job, or `None` if it no longer exists.
    pub fn status_of(&self, id: &JobId) -> Option<JobStatus> {
        self.jobs.get(id).map(|entry| entry.status)
    }

    /// All jobs, earliest submitted first.
    pub fn list_jobs(&self) -> Vec<PrintJob> {
        let mut jobs: Vec<PrintJob> = self.jobs.iter().map(|e| e.value().clone()).collect();
        jobs.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        jobs
    }

    /// Earliest submitted job currently in `status`.
    pub fn next_with_status(&self, status: JobStatus) -> Option<PrintJob> {
        self.jobs
            .iter()
            .filter(|e| e.status == status)
            .min_by(|a, b| {
                a.submitted_at
                    .cmp(&b.submitted_at)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .map(|e| e.value().clone())
    }

    /// Cancel a `Queued` or `Printing` job.
    pub async fn cancel(&self, id: &JobId) -> AppResult<bool> {
        let changed = self
            .modify(id, |job| {
                if matches!(job.status, JobStatus::Queued | JobStatus::Printing) {
                    job.status = JobStatus::Cancelled;
                    true
                } else {
                    false
                }
            })
            .await?;
        self.log_operator_action(id, "cancel", changed.as_ref());
        Ok(changed.is_some())
    }

    /// Requeue a `Failed` job with a clean error log.
    pub async fn retry(&self, id: &JobId) -> AppResult<bool> {
        let changed = self
            .modify(id, |job| {
                if job.status == JobStatus::Failed {
                    job.status = JobStatus::Queued;
                    job.error_log.clear();
                    true
                } else {
                    false
                }
            })
            .await?;
        self.log_operator_action(id, "retry", changed.as_ref());
        Ok(changed.is_some())
    }

    /// Commit a previewed job for printing.
    pub async fn confirm_print(&self, id: &JobId) -> AppResult<bool> {
        let changed = self
            .transition(id, JobStatus::Previewing, JobStatus::Printing)
            .await?;
        self.log_operator_action(id, "confirm", changed.as_ref());
        Ok(changed.is_some())
    }

    /// Delete a job and everything spooled for it, whatever its state.
    pub async fn remove(&self, id: &JobId) -> AppResult<bool> {
        let _guard = self.lock().await?;
        let existed = self.jobs.remove(id).is_some();
        let had_record = record::delete_record(&self.root, id).await?;

        let source_dir = self.source_dir(id);
        match fs::remove_dir_all(&source_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to remove spooled sources: {}", source_dir.display()),
                    e,
                ));
            }
        }

        if existed || had_record {
            tracing::info!(job_id = %id, "Removed job");
        }
        Ok(existed || had_record)
    }

    /// Move a job from `from` to `to`, only if it is still in `from`.
    ///
    /// Returns the updated snapshot, or `None` when the job is gone or in
    /// another state.
    pub async fn transition(
        &self,
        id: &JobId,
        from: JobStatus,
        to: JobStatus,
    ) -> AppResult<Option<PrintJob>> {
        if !from.can_transition_to(to) {
            return Err(AppError::validation(format!(
                "Illegal job transition {from} -> {to}"
            )));
        }
        let updated = self
            .modify(id, |job| {
                if job.status == from {
                    job.status = to;
                    true
                } else {
                    false
                }
            })
            .await?;
        if updated.is_some() {
            tracing::info!(job_id = %id, from = %from, to = %to, "Job status changed");
        }
        Ok(updated)
    }

    /// Log `message` and mark the job `Failed`, if it is being processed.
    pub async fn record_failure(&self, id: &JobId, message: &str) -> AppResult<bool> {
        let updated = self
            .modify(id, |job| {
                if matches!(job.status, JobStatus::Previewing | JobStatus::Printing) {
                    job.append_error(message);
                    job.status = JobStatus::Failed;
                    true
                } else {
                    false
                }
            })
            .await?;
        if updated.is_some() {
            tracing::error!(job_id = %id, error = message, "Job failed");
        }
        Ok(updated.is_some())
    }

    /// Copy an input file into this job's spool directory.
    ///
    /// Returns the absolute path of the spooled copy.
    pub async fn spool_source(&self, id: &JobId, source: &Path) -> AppResult<PathBuf> {
        let file_name = source.file_name().ok_or_else(|| {
            AppError::validation(format!("Source path has no file name: {}", source.display()))
        })?;

        let dir = self.source_dir(id);
        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create spool directory: {}", dir.display()),
                e,
            )
        })?;

        let target = dir.join(file_name);
        fs::copy(source, &target).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to spool source file: {}", source.display()),
                e,
            )
        })?;

        let absolute = fs::canonicalize(&target).await?;
        tracing::debug!(job_id = %id, path = %absolute.display(), "Spooled source file");
        Ok(absolute)
    }

    /// Apply `change` to a job under the write lock and persist the result.
    ///
    /// `change` returns whether it modified the job; nothing is written
    /// when it did not.
    async fn modify<F>(&self, id: &JobId, change: F) -> AppResult<Option<PrintJob>>
    where
        F: FnOnce(&mut PrintJob) -> bool,
    {
        let _guard = self.lock().await?;
        let Some(mut job) = self.sync_locked(id).await? else {
            return Ok(None);
        };
        if !change(&mut job) {
            return Ok(None);
        }

        record::write_record(&self.root, &job).await?;
        self.jobs.insert(job.id, job.clone());
        Ok(Some(job))
    }

    /// Reload the index from the records on disk.
    ///
    /// Picks up jobs submitted, changed or removed by other processes.
    pub async fn refresh(&self) -> AppResult<()> {
        let _guard = self.lock().await?;
        let on_disk = record::load_records(&self.root).await?;

        let before = self.jobs.len();
        let ids: HashSet<JobId> = on_disk.iter().map(|job| job.id).collect();
        self.jobs.retain(|id, _| ids.contains(id));
        for job in on_disk {
            self.jobs.insert(job.id, job);
        }
        if self.jobs.len() != before {
            tracing::debug!(before, after = self.jobs.len(), "Refreshed job index");
        }
        Ok(())
    }

    /// Re-read one job's record and update the index with it.
    ///
    /// Returns `None` when the job no longer exists.
    pub async fn sync_job(&self, id: &JobId) -> AppResult<Option<PrintJob>> {
        let _guard = self.write_lock.lock().await;
        self.sync_locked(id).await
    }

    async fn sync_locked(&self, id: &JobId) -> AppResult<Option<PrintJob>> {
        match record::read_job(&self.root, id).await? {
            Some(job) => {
                self.jobs.insert(job.id, job.clone());
                Ok(Some(job))
            }
            None => {
                self.jobs.remove(id);
                Ok(None)
            }
        }
    }

    /// Take the in-process write lock, then the cross-process spool lock.
    async fn lock(&self) -> AppResult<(MutexGuard<'_, ()>, SpoolLock)> {
        let guard = self.write_lock.lock().await;
        let spool = SpoolLock::acquire(&self.root).await?;
        Ok((guard, spool))
    }

    fn log_operator_action(&self, id: &JobId, action: &str, outcome: Option<&PrintJob>) {
        match outcome {
            Some(job) => tracing::info!(job_id = %id, action, status = %job.status, "Operator action applied"),
            None => tracing::debug!(
                job_id = %id,
                action,
                status = ?self.status_of(id),
                "Operator action not applicable"
            ),
        }
    }
}
