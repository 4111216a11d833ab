//! Multipart form handling for catalog create/update requests
//!
//! Catalog endpoints accept `multipart/form-data` with plain text fields
//! (`nameRu`, `categoryId`, ...) and up to [`MAX_IMAGES_PER_REQUEST`] files
//! under the `images` field.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use axum::extract::Multipart;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::shared::constants::{
    ALLOWED_IMAGE_MIME_TYPES, IMAGES_FIELD, MAX_IMAGES_PER_REQUEST, MAX_IMAGE_SIZE,
};

/// An uploaded file held in memory until it is handed to storage
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// File extension (with leading dot) for the stored copy.
    ///
    /// Prefers the extension of the original filename and falls back to one
    /// derived from the content type.
    pub fn extension(&self) -> String {
        let from_name = Path::new(&self.original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| ext.to_ascii_lowercase());

        match from_name.or_else(|| extension_from_content_type(&self.content_type)) {
            Some(ext) => format!(".{}", ext),
            None => String::new(),
        }
    }
}

fn extension_from_content_type(content_type: &str) -> Option<String> {
    let ext = match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => return None,
    };
    Some(ext.to_string())
}

pub fn is_image_mime_type_allowed(content_type: &str) -> bool {
    ALLOWED_IMAGE_MIME_TYPES.contains(&content_type)
}

/// Text fields and validated image files collected from a multipart body
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: Vec<UploadedFile>,
}

impl MultipartForm {
    /// Drain a multipart body, validating every image against the upload rules
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            debug!("Failed to read multipart field: {}", e);
            AppError::BadRequest(format!("Failed to read multipart data: {}", e))
        })? {
            let field_name = field.name().unwrap_or("").to_string();
            let is_image_field = field_name == IMAGES_FIELD || field_name == "images[]";

            if is_image_field {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let original_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                form.push_file(UploadedFile {
                    original_name,
                    content_type,
                    data: data.to_vec(),
                })?;
            } else if field.file_name().is_some() {
                debug!("Ignoring unexpected file field: {}", field_name);
            } else {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read field '{}': {}", field_name, e))
                })?;
                form.fields.insert(field_name, text);
            }
        }

        Ok(form)
    }

    fn push_file(&mut self, file: UploadedFile) -> Result<()> {
        if self.files.len() >= MAX_IMAGES_PER_REQUEST {
            return Err(AppError::BadRequest(format!(
                "Too many images. Maximum is {} per request",
                MAX_IMAGES_PER_REQUEST
            )));
        }

        if file.data.len() > MAX_IMAGE_SIZE {
            return Err(AppError::BadRequest(format!(
                "File '{}' too large. Maximum size is {} MB",
                file.original_name,
                MAX_IMAGE_SIZE / 1024 / 1024
            )));
        }

        if !is_image_mime_type_allowed(&file.content_type) {
            return Err(AppError::BadRequest(format!(
                "File type '{}' is not allowed. Allowed types: {}",
                file.content_type,
                ALLOWED_IMAGE_MIME_TYPES.join(", ")
            )));
        }

        self.files.push(file);
        Ok(())
    }

    /// Text value of a field; absent and whitespace-only fields yield `None`
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .filter(|value| !value.trim().is_empty())
            .cloned()
    }

    /// Parse a field into `T`; absent or blank fields yield `None`
    pub fn parse<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
    {
        match self.fields.get(name).map(|s| s.trim()) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
                AppError::Validation(format!("Field '{}' has an invalid value '{}'", name, raw))
            }),
        }
    }

    pub fn into_files(self) -> Vec<UploadedFile> {
        self.files
    }
}

#[cfg(test)]
impl MultipartForm {
    pub fn with_fields(fields: &[(&str, &str)]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: Vec::new(),
        }
    }
}
