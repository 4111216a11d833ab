//! Local-disk file storage
//!
//! Files are stored flat in the upload directory under generated names and
//! served back as `<base_url>/<name>`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::FileStorage;
use crate::core::config::UploadConfig;
use crate::core::error::{AppError, Result};
use crate::shared::multipart::UploadedFile;

pub struct LocalFileStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalFileStorage {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            root: config.dir.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create the upload directory if it does not exist yet
    pub async fn ensure_root_exists(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::Internal(format!(
                "Failed to create upload directory {}: {}",
                self.root.display(),
                e
            ))
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Unique name: `<unix millis>-<uuid><ext>`
    fn generate_file_name(file: &UploadedFile) -> String {
        format!(
            "{}-{}{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            file.extension()
        )
    }
}

/// Extract the stored filename from a full URL or a relative path.
///
/// Only the last path segment is used, so
/// `http://host/upload/products/a.jpg`, `/upload/a.jpg` and `a.jpg` all
/// resolve to `a.jpg`. Returns `None` for references that cannot name a file
/// inside the upload directory.
pub fn extract_file_name(reference: &str) -> Option<&str> {
    let without_scheme = reference
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(reference);

    // Drop query string and fragment
    let path = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or(without_scheme);

    let name = path.rsplit('/').next()?.trim();

    if name.is_empty() || name == "." || name == ".." || name.contains('\\') {
        return None;
    }

    // A bare host ("http://example.com") has no path segment
    if reference.contains("://") && !path.contains('/') {
        return None;
    }

    Some(name)
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn save_file(&self, file: &UploadedFile) -> Result<String> {
        self.ensure_root_exists().await?;

        let file_name = Self::generate_file_name(file);
        let path = self.root.join(&file_name);

        fs::write(&path, &file.data).await.map_err(|e| {
            AppError::Internal(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        debug!(
            "Stored upload '{}' as {} ({} bytes)",
            file.original_name,
            path.display(),
            file.data.len()
        );

        Ok(format!("{}/{}", self.base_url, file_name))
    }

    async fn delete_file(&self, reference: &str) -> Result<()> {
        if reference.is_empty() {
            return Ok(());
        }

        let Some(file_name) = extract_file_name(reference) else {
            warn!("Cannot extract filename from: {}", reference);
            return Ok(());
        };

        let path = self.root.join(file_name);

        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted file: {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "File not found: {} (already deleted or never stored)",
                    path.display()
                );
                Ok(())
            }
            Err(e) => Err(AppError::Internal(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_in(dir: &Path) -> LocalFileStorage {
        LocalFileStorage::new(&UploadConfig {
            dir: dir.to_path_buf(),
            base_url: "http://localhost:3000/".to_string(),
        })
    }

    fn jpeg(name: &str) -> UploadedFile {
        UploadedFile {
            original_name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            data: b"not really a jpeg".to_vec(),
        }
    }

    #[test]
    fn test_extract_file_name() {
        assert_eq!(
            extract_file_name("http://localhost:3000/1700000000000-abc.jpg"),
            Some("1700000000000-abc.jpg")
        );
        assert_eq!(
            extract_file_name("https://cdn.example.com/upload/products/a.png?v=2#top"),
            Some("a.png")
        );
        assert_eq!(extract_file_name("/upload/products/b.jpg"), Some("b.jpg"));
        assert_eq!(extract_file_name("c.webp"), Some("c.webp"));
        assert_eq!(extract_file_name("http://localhost:3000"), None);
        assert_eq!(extract_file_name("http://localhost:3000/"), None);
        assert_eq!(extract_file_name("/upload/.."), None);
        assert_eq!(extract_file_name(""), None);
    }

    #[tokio::test]
    async fn test_save_file_writes_under_root_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(dir.path());

        let url = storage.save_file(&jpeg("cat.jpg")).await.unwrap();

        assert!(url.starts_with("http://localhost:3000/"));
        assert!(url.ends_with(".jpg"));
        let name = extract_file_name(&url).unwrap();
        let stored = std::fs::read(dir.path().join(name)).unwrap();
        assert_eq!(stored, b"not really a jpeg");
    }

    #[tokio::test]
    async fn test_save_files_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("upload");
        let storage = storage_in(&nested);

        let urls = storage
            .save_files(&[jpeg("a.jpg"), jpeg("b.jpg")])
            .await
            .unwrap();

        assert_eq!(urls.len(), 2);
        assert_ne!(urls[0], urls[1]);
        assert!(nested.is_dir());
        assert!(storage.save_files(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(dir.path());
        let url = storage.save_file(&jpeg("dog.jpg")).await.unwrap();
        let path = dir.path().join(extract_file_name(&url).unwrap());
        assert!(path.exists());

        storage.delete_file(&url).await.unwrap();
        assert!(!path.exists());

        // Second call on the same reference is tolerated
        storage.delete_file(&url).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_file_accepts_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(dir.path());
        let url = storage.save_file(&jpeg("x.jpg")).await.unwrap();
        let name = extract_file_name(&url).unwrap().to_string();

        storage
            .delete_file(&format!("/upload/brands/{}", name))
            .await
            .unwrap();
        assert!(!dir.path().join(name).exists());
    }

    #[tokio::test]
    async fn test_delete_files_continues_past_missing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(dir.path());
        let first = storage.save_file(&jpeg("1.jpg")).await.unwrap();
        let second = storage.save_file(&jpeg("2.jpg")).await.unwrap();

        let deleted = storage
            .delete_files(&[
                first.clone(),
                "http://localhost:3000/never-stored.jpg".to_string(),
                second.clone(),
            ])
            .await;

        assert_eq!(deleted, 3);
        assert!(!dir.path().join(extract_file_name(&first).unwrap()).exists());
        assert!(!dir.path().join(extract_file_name(&second).unwrap()).exists());
    }
}
