use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::dtos::{
    AuthResponseDto, LoginRequestDto, RegisterRequestDto, UpdateUserDto, UserResponseDto,
};
use crate::features::auth::guards::RequireAdmin;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::AuthService;
use crate::shared::types::{ApiResponse, MessageDto, Meta};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

/// Login with login name and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequestDto,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<LoginRequestDto>,
) -> Result<Json<ApiResponse<AuthResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let auth_response = service.login(dto).await?;
    Ok(Json(ApiResponse::success(Some(auth_response), None, None)))
}

/// Create an Admin account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequestDto,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Not allowed to assign the requested role"),
        (status = 409, description = "Login already taken")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn register(
    RequireAdmin(actor): RequireAdmin,
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<RegisterRequestDto>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = service.register(dto, &actor).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(user), None, None)),
    ))
}

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/auth/profile",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserResponseDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_profile(
    user: AuthenticatedUser,
    State(service): State<Arc<AuthService>>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let profile = service.get_profile(user.id).await?;
    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}

/// Update the current user's profile
#[utoipa::path(
    patch,
    path = "/auth/profile",
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Login already taken")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_profile(
    user: AuthenticatedUser,
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<UpdateUserDto>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let updated = service.update(user.id, dto, &user).await?;
    Ok(Json(ApiResponse::success(Some(updated), None, None)))
}

/// List all users
#[utoipa::path(
    get,
    path = "/auth/users",
    responses(
        (status = 200, description = "All users", body = ApiResponse<Vec<UserResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users(
    RequireAdmin(_actor): RequireAdmin,
    State(service): State<Arc<AuthService>>,
) -> Result<Json<ApiResponse<Vec<UserResponseDto>>>> {
    let users = service.find_all().await?;
    let total = users.len();
    Ok(Json(ApiResponse::success(
        Some(users),
        None,
        Some(Meta::total(total)),
    )))
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/auth/users/{id}",
    params(
        ("id" = i32, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User found", body = ApiResponse<UserResponseDto>),
        (status = 401, description = "Missing token or user not found")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_user(
    RequireAdmin(_actor): RequireAdmin,
    State(service): State<Arc<AuthService>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let user = service.find_one(id).await?;
    Ok(Json(ApiResponse::success(Some(user), None, None)))
}

/// Update a user by id
#[utoipa::path(
    patch,
    path = "/auth/users/{id}",
    params(
        ("id" = i32, Path, description = "User id")
    ),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Not allowed to modify this user"),
        (status = 409, description = "Login already taken")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_user(
    RequireAdmin(actor): RequireAdmin,
    State(service): State<Arc<AuthService>>,
    Path(id): Path<i32>,
    AppJson(dto): AppJson<UpdateUserDto>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let updated = service.update(id, dto, &actor).await?;
    Ok(Json(ApiResponse::success(Some(updated), None, None)))
}

/// Delete a user by id
#[utoipa::path(
    delete,
    path = "/auth/users/{id}",
    params(
        ("id" = i32, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User deleted", body = ApiResponse<MessageDto>),
        (status = 401, description = "Not allowed to delete this user")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_user(
    RequireAdmin(actor): RequireAdmin,
    State(service): State<Arc<AuthService>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageDto>>> {
    service.remove(id, &actor).await?;
    Ok(Json(ApiResponse::success(
        Some(MessageDto {
            message: format!("User {} deleted", id),
        }),
        None,
        None,
    )))
}
