//! Uploads written ahead of a database write

use tracing::warn;

use super::FileStorage;
use crate::core::error::Result;
use crate::shared::multipart::UploadedFile;

/// Files already saved for a row that has not been written yet.
///
/// Call [`StagedImages::settle`] with the outcome of the write: on failure the
/// staged files are removed again so they do not linger in the upload directory.
pub struct StagedImages<'a> {
    storage: &'a dyn FileStorage,
    urls: Vec<String>,
}

impl<'a> StagedImages<'a> {
    pub async fn stage(storage: &'a dyn FileStorage, files: &[UploadedFile]) -> Result<Self> {
        let urls = storage.save_files(files).await?;
        Ok(Self { storage, urls })
    }

    /// Whether any file was uploaded
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub async fn settle<T>(self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if !self.urls.is_empty() {
                let removed = self.storage.delete_files(&self.urls).await;
                warn!(
                    "Write failed ({}); removed {}/{} staged uploads",
                    e,
                    removed,
                    self.urls.len()
                );
            }
        }
        result
    }
}
