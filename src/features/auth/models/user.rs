use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Account role
///
/// Stored as the `user_role` Postgres enum (`super_admin`, `admin`) and
/// exposed over JSON as `superAdmin` / `admin`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum UserRole {
    SuperAdmin,
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::SuperAdmin => write!(f, "superAdmin"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

/// Database model for users
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub login: String,
    /// Argon2 PHC string, never serialized
    pub password: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
