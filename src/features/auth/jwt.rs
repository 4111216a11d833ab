//! Access token issuing and validation (HS256)

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::{AuthenticatedUser, Claims};
use crate::features::auth::models::User;

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl_secs: config.token_ttl.as_secs() as i64,
        }
    }

    /// Token lifetime in seconds
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            login: user.login.clone(),
            role: user.role,
            iat: now,
            exp: now + self.ttl_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    pub fn validate(&self, token: &str) -> Result<AuthenticatedUser> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub", "exp"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!("Token rejected: {}", e);
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::Unauthorized("Token expired".to_string()),
                _ => AppError::Unauthorized("Invalid token".to_string()),
            }
        })?;

        AuthenticatedUser::try_from(token_data.claims)
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::features::auth::models::UserRole;

    fn service(secret: &str, ttl_secs: u64) -> JwtService {
        JwtService::new(&AuthConfig {
            jwt_secret: secret.to_string(),
            token_ttl: Duration::from_secs(ttl_secs),
            super_admin_login: "superadmin".to_string(),
        })
    }

    fn user(role: UserRole) -> User {
        User {
            id: 7,
            login: "manager".to_string(),
            password: String::new(),
            name: None,
            email: None,
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_then_validate() {
        let jwt = service("test-secret", 3600);
        let token = jwt.issue(&user(UserRole::Admin)).unwrap();

        let identity = jwt.validate(&token).unwrap();
        assert_eq!(identity.id, 7);
        assert_eq!(identity.login, "manager");
        assert_eq!(identity.role, UserRole::Admin);
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let token = service("secret-a", 3600)
            .issue(&user(UserRole::SuperAdmin))
            .unwrap();
        let err = service("secret-b", 3600).validate(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let jwt = service("test-secret", 3600);
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "1".to_string(),
            login: "old".to_string(),
            role: UserRole::Admin,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &jwt.encoding_key).unwrap();

        match jwt.validate(&token) {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Token expired"),
            other => panic!("expected expiry rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(service("s", 60).validate("not.a.jwt").is_err());
    }
}
