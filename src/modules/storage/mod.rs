//! Storage module for uploaded files
//!
//! Images are written to a local directory and referenced by absolute URL.
//! Services depend on the [`FileStorage`] trait, not on the directory layout.

mod local_storage;
mod staged;

use async_trait::async_trait;
use tracing::warn;

use crate::core::error::Result;
use crate::shared::multipart::UploadedFile;

pub use local_storage::LocalFileStorage;
pub use staged::StagedImages;

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Persist one file and return the URL it is reachable under
    async fn save_file(&self, file: &UploadedFile) -> Result<String>;

    /// Remove a stored file by URL or relative path; a missing file is not an error
    async fn delete_file(&self, reference: &str) -> Result<()>;

    /// Persist files one after another, preserving input order
    async fn save_files(&self, files: &[UploadedFile]) -> Result<Vec<String>> {
        let mut urls = Vec::with_capacity(files.len());
        for file in files {
            urls.push(self.save_file(file).await?);
        }
        Ok(urls)
    }

    /// Best-effort removal of several files.
    ///
    /// Failures are logged and skipped. Returns how many deletions succeeded.
    async fn delete_files(&self, references: &[String]) -> usize {
        let mut deleted = 0;
        for reference in references {
            match self.delete_file(reference).await {
                Ok(()) => deleted += 1,
                Err(e) => warn!("Failed to delete file {}: {}", reference, e),
            }
        }
        deleted
    }
}
