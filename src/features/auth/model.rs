use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::auth::models::UserRole;

/// Identity of the caller, decoded from the bearer token by the auth middleware
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub id: i32,
    pub login: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    /// Check if user is the super admin
    pub fn is_super_admin(&self) -> bool {
        self.role == UserRole::SuperAdmin
    }

    /// Check if user may manage the catalog (super admin or admin)
    pub fn has_admin_access(&self) -> bool {
        matches!(self.role, UserRole::SuperAdmin | UserRole::Admin)
    }
}

/// Claims carried by issued access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub login: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

impl TryFrom<Claims> for AuthenticatedUser {
    type Error = std::num::ParseIntError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            id: claims.sub.parse()?,
            login: claims.login,
            role: claims.role,
        })
    }
}
