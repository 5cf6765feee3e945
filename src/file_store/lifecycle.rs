/// File Lifecycle Manager
///
/// Writes uploads under unique names, deletes stored files best-effort and
/// removes files written by a request whose transaction did not commit.
use crate::{
    config::UploadConfig,
    error::{WorkError, WorkResult},
    file_store::{disk::DiskFileBackend, paths, FileBackend, StoredObject, Upload, UploadSlot},
};
use chrono::Utc;
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Outcome of a best-effort batch delete
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompensationReport {
    /// Files that existed and were removed
    pub removed: usize,
    /// Files that were already gone
    pub missing: usize,
    /// Paths that could not be removed
    pub failed: Vec<String>,
}

/// Lifecycle manager for stored media files
#[derive(Clone)]
pub struct FileLifecycle {
    backend: Arc<dyn FileBackend>,
    limits: UploadConfig,
}

impl FileLifecycle {
    pub fn new(backend: Arc<dyn FileBackend>, limits: UploadConfig) -> Self {
        Self { backend, limits }
    }

    /// Lifecycle manager over a disk backend rooted at `root`
    pub fn disk(root: PathBuf, limits: UploadConfig) -> Self {
        Self::new(Arc::new(DiskFileBackend::new(root)), limits)
    }

    pub fn limits(&self) -> &UploadConfig {
        &self.limits
    }

    /// Check an upload before anything is written
    pub fn validate_upload(&self, upload: &Upload) -> WorkResult<()> {
        if upload.data.is_empty() {
            return Err(WorkError::Validation(format!(
                "{} upload '{}' is empty",
                upload.slot.as_str(),
                upload.original_name
            )));
        }

        if upload.data.len() > self.limits.max_file_size {
            return Err(WorkError::Validation(format!(
                "{} upload '{}' exceeds maximum size of {} bytes",
                upload.slot.as_str(),
                upload.original_name,
                self.limits.max_file_size
            )));
        }

        upload.check_kind()
    }

    /// Unique relative location for an upload
    fn stored_name(upload: &Upload) -> String {
        let extension = match upload.slot {
            UploadSlot::TargetFile => ".mind".to_string(),
            _ => upload
                .extension()
                .map(|e| format!(".{}", e))
                .unwrap_or_default(),
        };

        format!(
            "{}/{}{}_{}{}",
            upload.slot.directory(&upload.mime_type),
            upload.slot.prefix(&upload.mime_type),
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            extension
        )
    }

    /// Write an upload and return its public path
    pub async fn write_upload(&self, upload: &Upload) -> WorkResult<String> {
        self.validate_upload(upload)?;

        let relative = Self::stored_name(upload);
        self.backend.write(&relative, upload.data.clone()).await?;

        let public = paths::public_path(&relative);
        debug!("Stored {} upload at {}", upload.slot.as_str(), public);

        Ok(public)
    }

    /// Delete a stored file by its row reference
    ///
    /// Absent files are logged, not reported as errors. Paths that do not
    /// resolve inside the storage root are refused.
    pub async fn delete_by_path(&self, path: &str) -> WorkResult<()> {
        let relative = paths::normalize(path)?;

        if self.backend.delete(&relative).await? {
            info!("Deleted file {}", path);
        } else {
            debug!("File already absent: {}", path);
        }

        Ok(())
    }

    /// Check whether a referenced file is present
    pub async fn exists(&self, path: &str) -> WorkResult<bool> {
        let relative = paths::normalize(path)?;
        self.backend.exists(&relative).await
    }

    /// Best-effort batch delete
    ///
    /// Failures are logged and collected; nothing is propagated.
    pub async fn compensate(&self, paths: &[String]) -> CompensationReport {
        let mut report = CompensationReport::default();
        if paths.is_empty() {
            return report;
        }

        let results = join_all(paths.iter().map(|path| async move {
            let outcome = match paths::normalize(path) {
                Ok(relative) => self.backend.delete(&relative).await,
                Err(e) => Err(e),
            };
            (path, outcome)
        }))
        .await;

        for (path, outcome) in results {
            match outcome {
                Ok(true) => report.removed += 1,
                Ok(false) => {
                    debug!("File already absent: {}", path);
                    report.missing += 1;
                }
                Err(e) => {
                    warn!("Failed to delete file {}: {}", path, e);
                    report.failed.push(path.clone());
                }
            }
        }

        if report.failed.is_empty() {
            info!(
                "File cleanup finished: {} removed, {} already absent",
                report.removed, report.missing
            );
        } else {
            error!(
                "File cleanup left {} file(s) behind: {:?}",
                report.failed.len(),
                report.failed
            );
        }

        report
    }

    /// Every stored file, with public paths
    pub async fn list_objects(&self) -> WorkResult<Vec<StoredObject>> {
        let objects = self.backend.list().await?;
        Ok(objects
            .into_iter()
            .map(|o| StoredObject {
                relative_path: paths::public_path(&o.relative_path),
                ..o
            })
            .collect())
    }
}
