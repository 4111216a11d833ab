use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response, Router};

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::models::UserRole;
use crate::modules::storage::FileStorage;
use crate::shared::multipart::UploadedFile;

pub fn create_super_admin_user() -> AuthenticatedUser {
    AuthenticatedUser {
        id: 1,
        login: "superadmin".to_string(),
        role: UserRole::SuperAdmin,
    }
}

async fn inject_super_admin_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(create_super_admin_user());
    next.run(request).await
}

/// Wrap a router so every request is authenticated as the super admin
pub fn with_super_admin_auth(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_super_admin_middleware))
}

/// In-memory [`FileStorage`] that records deletions and fails on chosen references
#[derive(Default)]
pub struct RecordingStorage {
    saved: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
    failing: HashSet<String>,
}

impl RecordingStorage {
    pub fn failing_on(references: &[&str]) -> Self {
        Self {
            failing: references.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn saved(&self) -> Vec<String> {
        self.saved.lock().unwrap().clone()
    }

    /// Every reference passed to `delete_file`, including failed ones
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileStorage for RecordingStorage {
    async fn save_file(&self, file: &UploadedFile) -> Result<String> {
        let url = format!("http://test/{}", file.original_name);
        self.saved.lock().unwrap().push(url.clone());
        Ok(url)
    }

    async fn delete_file(&self, reference: &str) -> Result<()> {
        self.deleted.lock().unwrap().push(reference.to_string());
        if self.failing.contains(reference) {
            return Err(AppError::Internal(format!("cannot delete {}", reference)));
        }
        Ok(())
    }
}
