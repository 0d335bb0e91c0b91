//! On-disk job records.
//!
//! One pretty-printed JSON file per job, `<root>/<jobId>.json`. Writes go
//! to `<jobId>.json.tmp` first and are renamed into place.

use std::path::{Path, PathBuf};

use tokio::fs;

use spoolhub_core::error::{AppError, ErrorKind};
use spoolhub_core::result::AppResult;
use spoolhub_core::types::JobId;
use spoolhub_entity::job::PrintJob;
use spoolhub_entity::job::model::record_file_name;

const RECORD_SUFFIX: &str = ".json";
const TEMP_SUFFIX: &str = ".json.tmp";

/// Path of a job's record under `root`.
pub fn record_path(root: &Path, id: &JobId) -> PathBuf {
    root.join(record_file_name(id))
}

/// Atomically write `job`'s record.
pub async fn write_record(root: &Path, job: &PrintJob) -> AppResult<()> {
    let path = record_path(root, &job.id);
    let temp = root.join(format!("{}{TEMP_SUFFIX}", job.id));
    let json = serde_json::to_vec_pretty(job)?;

    fs::write(&temp, &json).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to write job record: {}", temp.display()),
            e,
        )
    })?;
    fs::rename(&temp, &path).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to commit job record: {}", path.display()),
            e,
        )
    })
}

/// Delete a job's record. A missing record is not an error.
pub async fn delete_record(root: &Path, id: &JobId) -> AppResult<bool> {
    let path = record_path(root, id);
    match fs::remove_file(&path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to delete job record: {}", path.display()),
            e,
        )),
    }
}

/// Load every readable record under `root`.
///
/// Unreadable or corrupt records are logged and skipped. Leftover temp
/// files from interrupted writes are deleted.
pub async fn load_records(root: &Path) -> AppResult<Vec<PrintJob>> {
    let mut entries = fs::read_dir(root).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to scan spool directory: {}", root.display()),
            e,
        )
    })?;

    let mut jobs = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "Skipping unreadable spool entry");
                continue;
            }
        };
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if name.ends_with(TEMP_SUFFIX) {
            tracing::warn!(path = %path.display(), "Removing interrupted job record write");
            if let Err(e) = fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove temp record");
            }
            continue;
        }
        if !name.ends_with(RECORD_SUFFIX) {
            continue;
        }
        match entry.file_type().await {
            Ok(file_type) if file_type.is_file() => {}
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable job record");
                continue;
            }
        }

        match read_record(&path).await {
            Ok(job) => jobs.push(job),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable job record");
            }
        }
    }

    Ok(jobs)
}

/// Read one job's current record. A missing record is `None`.
pub async fn read_job(root: &Path, id: &JobId) -> AppResult<Option<PrintJob>> {
    let path = record_path(root, id);
    match fs::try_exists(&path).await {
        Ok(true) => read_record(&path).await.map(Some),
        Ok(false) => Ok(None),
        Err(e) => Err(AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to check job record: {}", path.display()),
            e,
        )),
    }
}

async fn read_record(path: &Path) -> AppResult<PrintJob> {
    let bytes = fs::read(path).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to read job record: {}", path.display()),
            e,
        )
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoolhub_entity::job::PrintSettings;

    fn job() -> PrintJob {
        PrintJob::new(
            "report.txt",
            "alice",
            PrintSettings::default(),
            vec![PathBuf::from("/spool/report.txt")],
        )
    }

    #[tokio::test]
    async fn test_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let job = job();

        write_record(dir.path(), &job).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, [format!("{}.json", job.id)]);
    }

    #[tokio::test]
    async fn test_load_skips_corrupt_and_temp_records() {
        let dir = tempfile::tempdir().unwrap();
        let good = job();
        write_record(dir.path(), &good).await.unwrap();
        std::fs::write(dir.path().join("garbage.json"), b"{ not json").unwrap();
        std::fs::write(dir.path().join("half.json.tmp"), b"{ \"id\": ").unwrap();
        std::fs::write(dir.path().join("README.txt"), b"ignored").unwrap();

        let jobs = load_records(dir.path()).await.unwrap();
        assert_eq!(jobs, vec![good]);
        assert!(!dir.path().join("half.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_load_skips_directories_named_like_records() {
        let dir = tempfile::tempdir().unwrap();
        let good = job();
        write_record(dir.path(), &good).await.unwrap();
        std::fs::create_dir(dir.path().join("folder.json")).unwrap();

        let jobs = load_records(dir.path()).await.unwrap();
        assert_eq!(jobs, vec![good]);
    }

    #[tokio::test]
    async fn test_read_job() {
        let dir = tempfile::tempdir().unwrap();
        let stored = job();
        assert_eq!(read_job(dir.path(), &stored.id).await.unwrap(), None);

        write_record(dir.path(), &stored).await.unwrap();
        assert_eq!(read_job(dir.path(), &stored.id).await.unwrap(), Some(stored.clone()));

        std::fs::write(record_path(dir.path(), &stored.id), b"{ broken").unwrap();
        let err = read_job(dir.path(), &stored.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Serialization);
    }

    #[tokio::test]
    async fn test_delete_missing_record_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!delete_record(dir.path(), &JobId::new()).await.unwrap());
    }
}
