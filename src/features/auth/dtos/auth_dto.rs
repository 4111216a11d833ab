use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::auth::models::{User, UserRole};
use crate::shared::validation::LOGIN_REGEX;

/// Request DTO for user login
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequestDto {
    #[validate(length(min = 1, message = "Login is required"))]
    pub login: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request DTO for creating a user account
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequestDto {
    #[validate(
        length(min = 3, max = 50, message = "Login must be 3-50 characters"),
        regex(
            path = *LOGIN_REGEX,
            message = "Login must start with a letter and contain only letters, digits, '_', '.' or '-'"
        )
    )]
    pub login: String,

    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,

    #[validate(length(max = 100, message = "Name must not exceed 100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// Defaults to `admin`
    pub role: Option<UserRole>,
}

/// Partial update of a user account; absent fields are left unchanged
#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(
        length(min = 3, max = 50, message = "Login must be 3-50 characters"),
        regex(
            path = *LOGIN_REGEX,
            message = "Login must start with a letter and contain only letters, digits, '_', '.' or '-'"
        )
    )]
    pub login: Option<String>,

    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: Option<String>,

    #[validate(length(max = 100, message = "Name must not exceed 100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// Honoured only when the SuperAdmin sends it
    pub role: Option<UserRole>,
}

/// Public view of a user (never includes the password hash)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponseDto {
    pub id: i32,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponseDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            login: user.login,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Response DTO for a successful login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponseDto {
    pub access_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
    pub user: UserResponseDto,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(login: &str, password: &str) -> RegisterRequestDto {
        RegisterRequestDto {
            login: login.to_string(),
            password: password.to_string(),
            name: None,
            email: None,
            role: None,
        }
    }

    #[test]
    fn test_register_validation() {
        assert!(register("manager", "secret1").validate().is_ok());
        assert!(register("2fast", "secret1").validate().is_err());
        assert!(register("ab", "secret1").validate().is_err());
        assert!(register("manager", "12345").validate().is_err());

        let mut bad_email = register("manager", "secret1");
        bad_email.email = Some("not-an-email".to_string());
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_update_validation_skips_absent_fields() {
        assert!(UpdateUserDto::default().validate().is_ok());

        let patch = UpdateUserDto {
            password: Some("123".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_register_accepts_role_names() {
        let dto: RegisterRequestDto = serde_json::from_str(
            r#"{"login":"manager","password":"secret1","role":"admin"}"#,
        )
        .unwrap();
        assert_eq!(dto.role, Some(UserRole::Admin));
    }

    #[test]
    fn test_user_response_hides_password() {
        let user = User {
            id: 1,
            login: "superadmin".to_string(),
            password: "$argon2id$...".to_string(),
            name: Some("Super Admin".to_string()),
            email: None,
            role: UserRole::SuperAdmin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(UserResponseDto::from(user)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "superAdmin");
        assert!(json.get("createdAt").is_some());
    }
}
