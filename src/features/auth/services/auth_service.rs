use std::sync::Arc;

use sqlx::PgPool;

use crate::core::error::{map_db_error, AppError, Result};
use crate::features::auth::dtos::{
    AuthResponseDto, LoginRequestDto, RegisterRequestDto, UpdateUserDto, UserResponseDto,
};
use crate::features::auth::jwt::JwtService;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::models::{User, UserRole};
use crate::features::auth::password::{hash_password, verify_password};
use crate::features::auth::policy;

const USER_COLUMNS: &str = "id, login, password, name, email, role, created_at, updated_at";

pub struct AuthService {
    pool: PgPool,
    jwt: Arc<JwtService>,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtService>) -> Self {
        Self { pool, jwt }
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch user {}: {:?}", id, e);
                AppError::Database(e)
            })
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE login = $1",
            USER_COLUMNS
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch user by login: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn ensure_login_available(&self, login: &str) -> Result<()> {
        if self.find_by_login(login).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "User with login \"{}\" already exists",
                login
            )));
        }
        Ok(())
    }

    /// Check credentials and issue an access token
    pub async fn login(&self, dto: LoginRequestDto) -> Result<AuthResponseDto> {
        let user = self
            .find_by_login(&dto.login)
            .await?
            .filter(|user| verify_password(&dto.password, &user.password))
            .ok_or_else(|| {
                tracing::debug!("Failed login attempt for '{}'", dto.login);
                AppError::Unauthorized("Invalid login or password".to_string())
            })?;

        let access_token = self.jwt.issue(&user)?;
        tracing::info!("User {} logged in", user.id);

        Ok(AuthResponseDto {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.ttl_secs(),
            user: user.into(),
        })
    }

    /// Create an account on behalf of `actor`
    pub async fn register(
        &self,
        dto: RegisterRequestDto,
        actor: &AuthenticatedUser,
    ) -> Result<UserResponseDto> {
        self.ensure_login_available(&dto.login).await?;
        let role = policy::register_role(actor, dto.role)?;
        let password = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (login, password, name, email, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&dto.login)
        .bind(&password)
        .bind(&dto.name)
        .bind(&dto.email)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_db_error(
                e,
                &format!("User with login \"{}\" already exists", dto.login),
            )
        })?;

        tracing::info!(
            "User {} ({}) registered by {}",
            user.id,
            user.role,
            actor.login
        );
        Ok(user.into())
    }

    /// Create the SuperAdmin unless one already exists.
    ///
    /// Returns `None` when a SuperAdmin is present (or appears concurrently).
    pub async fn create_super_admin(
        &self,
        login: &str,
        password: &str,
    ) -> Result<Option<UserResponseDto>> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE role = $1)")
                .bind(UserRole::SuperAdmin)
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::Database)?;

        if exists {
            return Ok(None);
        }

        let password = hash_password(password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (login, password, name, role)
            VALUES ($1, $2, 'Super Admin', $3)
            ON CONFLICT DO NOTHING
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(login)
        .bind(&password)
        .bind(UserRole::SuperAdmin)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create super admin: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(user.map(Into::into))
    }

    /// All users ordered by id
    pub async fn find_all(&self) -> Result<Vec<UserResponseDto>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY id ASC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list users: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(users.into_iter().map(Into::into).collect())
    }

    pub async fn find_one(&self, id: i32) -> Result<UserResponseDto> {
        self.find_by_id(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))
    }

    /// Profile of the token holder; a token for a deleted account is rejected
    pub async fn get_profile(&self, user_id: i32) -> Result<UserResponseDto> {
        self.find_by_id(user_id)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))
    }

    /// Apply a partial update to `target_id` on behalf of `actor`
    pub async fn update(
        &self,
        target_id: i32,
        dto: UpdateUserDto,
        actor: &AuthenticatedUser,
    ) -> Result<UserResponseDto> {
        let target = self
            .find_by_id(target_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

        let role = policy::update_role(actor, &target, dto.role)?;

        if let Some(login) = dto.login.as_deref() {
            if login != target.login {
                self.ensure_login_available(login).await?;
            }
        }

        let password = dto.password.as_deref().map(hash_password).transpose()?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET login = COALESCE($2, login),
                password = COALESCE($3, password),
                name = COALESCE($4, name),
                email = COALESCE($5, email),
                role = COALESCE($6, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(target_id)
        .bind(&dto.login)
        .bind(&password)
        .bind(&dto.name)
        .bind(&dto.email)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "User with this login already exists"))?;

        tracing::info!("User {} updated by {}", user.id, actor.login);
        Ok(user.into())
    }

    /// Delete `target_id` on behalf of `actor`
    pub async fn remove(&self, target_id: i32, actor: &AuthenticatedUser) -> Result<()> {
        let target = self
            .find_by_id(target_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

        policy::can_remove(actor, &target)?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(target_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete user {}: {:?}", target_id, e);
                AppError::Database(e)
            })?;

        tracing::info!("User {} deleted by {}", target_id, actor.login);
        Ok(())
    }
}
