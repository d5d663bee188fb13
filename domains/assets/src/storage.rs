//! Filesystem artifact storage
//!
//! Layout under the storage root:
//! - `images/{job_id}.png`
//! - `videos/{job_id}.mp4`
//! - `temp/{job_id}.{png|jpg}` — staged reference uploads
//!
//! Files are written straight to their final path; job ids are unique, so a
//! duplicate write can only overwrite the same job's own artifact. Returned
//! URLs are relative paths under `/storage/`.

use std::path::{Path, PathBuf};

use lumagen_common::{Error, Result};
use uuid::Uuid;

/// URL prefix the storage root is served under
pub const STORAGE_URL_PREFIX: &str = "/storage/";

#[derive(Debug, Clone)]
pub struct ArtifactStorage {
    root: PathBuf,
}

impl ArtifactStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage subdirectories. Called once at startup.
    pub async fn ensure_layout(&self) -> Result<()> {
        for subdir in ["images", "videos", "temp"] {
            tokio::fs::create_dir_all(self.root.join(subdir))
                .await
                .map_err(|e| {
                    Error::Internal(format!("Failed to create storage dir {}: {}", subdir, e))
                })?;
        }
        Ok(())
    }

    /// Write image bytes for a job and return the relative URL
    pub async fn write_image(&self, job_id: Uuid, bytes: &[u8]) -> Result<String> {
        let relative = format!("images/{}.png", job_id);
        self.write(&relative, bytes).await?;
        Ok(format!("{}{}", STORAGE_URL_PREFIX, relative))
    }

    /// Write video bytes for a job and return the relative URL
    pub async fn write_video(&self, job_id: Uuid, bytes: &[u8]) -> Result<String> {
        let relative = format!("videos/{}.mp4", job_id);
        self.write(&relative, bytes).await?;
        Ok(format!("{}{}", STORAGE_URL_PREFIX, relative))
    }

    /// Stage an uploaded reference image for an image-to-video job.
    /// Returns the absolute path recorded on the job row.
    pub async fn write_temp_reference(
        &self,
        job_id: Uuid,
        extension: &str,
        bytes: &[u8],
    ) -> Result<PathBuf> {
        let relative = format!("temp/{}.{}", job_id, extension);
        self.write(&relative, bytes).await?;
        Ok(self.root.join(relative))
    }

    /// Delete the file behind a `/storage/...` URL. A missing file is not an
    /// error, so deletion is idempotent.
    pub async fn delete_by_url(&self, url: &str) -> Result<()> {
        let Some(relative) = url.strip_prefix(STORAGE_URL_PREFIX) else {
            return Err(Error::Validation(format!("Not a storage URL: {}", url)));
        };
        if relative.contains("..") {
            return Err(Error::Validation(format!("Invalid storage path: {}", url)));
        }

        match tokio::fs::remove_file(self.root.join(relative)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Internal(format!(
                "Failed to delete artifact {}: {}",
                url, e
            ))),
        }
    }

    async fn write(&self, relative: &str, bytes: &[u8]) -> Result<()> {
        let path = self.root.join(relative);
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            Error::Internal(format!("Failed to write {}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn storage() -> (tempfile::TempDir, ArtifactStorage) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = ArtifactStorage::new(dir.path());
        storage.ensure_layout().await.expect("layout");
        (dir, storage)
    }

    #[tokio::test]
    async fn test_write_image_returns_storage_url() {
        let (_dir, storage) = storage().await;
        let job_id = Uuid::new_v4();

        let url = storage.write_image(job_id, b"png-bytes").await.unwrap();
        assert_eq!(url, format!("/storage/images/{}.png", job_id));

        let on_disk = storage.root().join(format!("images/{}.png", job_id));
        assert_eq!(tokio::fs::read(on_disk).await.unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn test_write_video_layout() {
        let (_dir, storage) = storage().await;
        let job_id = Uuid::new_v4();

        let url = storage.write_video(job_id, b"mp4-bytes").await.unwrap();
        assert_eq!(url, format!("/storage/videos/{}.mp4", job_id));
    }

    #[tokio::test]
    async fn test_temp_reference_path() {
        let (_dir, storage) = storage().await;
        let job_id = Uuid::new_v4();

        let path = storage
            .write_temp_reference(job_id, "jpg", b"jpeg-bytes")
            .await
            .unwrap();
        assert!(path.ends_with(format!("temp/{}.jpg", job_id)));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, storage) = storage().await;
        let job_id = Uuid::new_v4();
        let url = storage.write_image(job_id, b"png-bytes").await.unwrap();

        storage.delete_by_url(&url).await.unwrap();
        // Second delete finds nothing and still succeeds
        storage.delete_by_url(&url).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_rejects_traversal() {
        let (_dir, storage) = storage().await;
        let result = storage.delete_by_url("/storage/../etc/passwd").await;
        assert!(result.is_err());
        let result = storage.delete_by_url("/elsewhere/file.png").await;
        assert!(result.is_err());
    }
}
