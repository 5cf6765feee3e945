/// Disk-based file storage backend
use crate::{
    error::{WorkError, WorkResult},
    file_store::{FileBackend, StoredObject},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Disk storage backend
///
/// Stores files under the storage root using the relative layout produced by
/// the lifecycle manager (`images/`, `videos/`, `targets/`, ...).
#[derive(Clone)]
pub struct DiskFileBackend {
    base_path: PathBuf,
}

impl DiskFileBackend {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the absolute location for a relative path
    fn resolve(&self, relative_path: &str) -> PathBuf {
        self.base_path.join(relative_path)
    }

    /// Relative, forward-slash form of an absolute path under the root
    fn relativize(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.base_path).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

#[async_trait]
impl FileBackend for DiskFileBackend {
    async fn write(&self, relative_path: &str, data: Vec<u8>) -> WorkResult<()> {
        let path = self.resolve(relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                WorkError::FileOperation(format!("Failed to create upload directory: {}", e))
            })?;
        }

        fs::write(&path, data).await.map_err(|e| {
            WorkError::FileOperation(format!("Failed to write file {}: {}", relative_path, e))
        })?;

        Ok(())
    }

    async fn delete(&self, relative_path: &str) -> WorkResult<bool> {
        let path = self.resolve(relative_path);

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(WorkError::FileOperation(format!(
                "Failed to delete file {}: {}",
                relative_path, e
            ))),
        }
    }

    async fn exists(&self, relative_path: &str) -> WorkResult<bool> {
        match fs::metadata(self.resolve(relative_path)).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(WorkError::FileOperation(format!(
                "Failed to stat file {}: {}",
                relative_path, e
            ))),
        }
    }

    async fn list(&self) -> WorkResult<Vec<StoredObject>> {
        let mut objects = Vec::new();
        let mut pending = vec![self.base_path.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let metadata = entry.metadata().await?;
                if metadata.is_dir() {
                    pending.push(entry.path());
                    continue;
                }
                if !metadata.is_file() {
                    continue;
                }

                if let Some(relative_path) = self.relativize(&entry.path()) {
                    let modified_at: DateTime<Utc> = metadata.modified()?.into();
                    objects.push(StoredObject {
                        relative_path,
                        size: metadata.len(),
                        modified_at,
                    });
                }
            }
        }

        objects.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_and_exists() {
        let dir = tempdir().unwrap();
        let backend = DiskFileBackend::new(dir.path().to_path_buf());

        backend
            .write("images/image_1.png", b"png bytes".to_vec())
            .await
            .unwrap();

        assert!(backend.exists("images/image_1.png").await.unwrap());
        assert!(dir.path().join("images").join("image_1.png").exists());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let backend = DiskFileBackend::new(dir.path().to_path_buf());

        backend.write("videos/video_1.mp4", vec![0u8; 4]).await.unwrap();

        assert!(backend.delete("videos/video_1.mp4").await.unwrap());
        assert!(!backend.delete("videos/video_1.mp4").await.unwrap());
        assert!(!backend.exists("videos/video_1.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_walks_subdirectories() {
        let dir = tempdir().unwrap();
        let backend = DiskFileBackend::new(dir.path().to_path_buf());

        backend.write("targets/target_1.mind", vec![1]).await.unwrap();
        backend.write("images/image_1.png", vec![1, 2]).await.unwrap();

        let objects = backend.list().await.unwrap();
        let paths: Vec<&str> = objects.iter().map(|o| o.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["images/image_1.png", "targets/target_1.mind"]);
        assert_eq!(objects[0].size, 2);
    }

    #[tokio::test]
    async fn test_list_missing_root_is_empty() {
        let dir = tempdir().unwrap();
        let backend = DiskFileBackend::new(dir.path().join("uploads"));

        assert!(backend.list().await.unwrap().is_empty());
    }
}
