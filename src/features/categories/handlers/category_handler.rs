use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppQuery;
use crate::features::auth::guards::RequireAdmin;
use crate::features::categories::dtos::{
    CategoryFormDto, CategoryResponseDto, CreateCategoryDto, UpdateCategoryDto,
};
use crate::features::categories::services::CategoryService;
use crate::shared::cascade::CascadeSummary;
use crate::shared::multipart::MultipartForm;
use crate::shared::types::{ApiResponse, Meta};

/// Query params for deleting a category
#[derive(Debug, Deserialize, IntoParams)]
pub struct DeleteCategoryQuery {
    /// Delete brands and products as well (default false). Without it the
    /// request fails with 409 while the category still has brands.
    pub cascade: Option<bool>,
}

/// List all categories with their brands
#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "List of categories", body = ApiResponse<Vec<CategoryResponseDto>>),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(service): State<Arc<CategoryService>>,
) -> Result<Json<ApiResponse<Vec<CategoryResponseDto>>>> {
    let categories = service.find_all().await?;
    let total = categories.len();
    Ok(Json(ApiResponse::success(
        Some(categories),
        None,
        Some(Meta::total(total)),
    )))
}

/// Get category by id, including its brands
#[utoipa::path(
    get,
    path = "/categories/{id}",
    params(
        ("id" = i32, Path, description = "Category id")
    ),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<CategoryResponseDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service.find_one(id, true).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/categories",
    request_body(
        content = CategoryFormDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Invalid form or image"),
        (status = 401, description = "Authentication required"),
        (status = 409, description = "Name already taken")
    ),
    tag = "categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_category(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponseDto>>)> {
    let form = MultipartForm::read(multipart).await?;
    let dto = CreateCategoryDto::from_form(&form);
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let category = service.create(dto, form.into_files()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(category), None, None)),
    ))
}

/// Update a category; uploaded images replace the existing ones
#[utoipa::path(
    patch,
    path = "/categories/{id}",
    params(
        ("id" = i32, Path, description = "Category id")
    ),
    request_body(
        content = CategoryFormDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Invalid form or image"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Name already taken")
    ),
    tag = "categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_category(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let form = MultipartForm::read(multipart).await?;
    let dto = UpdateCategoryDto::from_form(&form);
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let category = service.update(id, dto, form.into_files()).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Delete a category; `cascade=true` also removes its brands and products
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    params(
        ("id" = i32, Path, description = "Category id"),
        DeleteCategoryQuery
    ),
    responses(
        (status = 200, description = "Category deleted", body = ApiResponse<CascadeSummary>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category still has brands and cascade is not set")
    ),
    tag = "categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_category(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i32>,
    AppQuery(query): AppQuery<DeleteCategoryQuery>,
) -> Result<Json<ApiResponse<CascadeSummary>>> {
    let summary = if query.cascade.unwrap_or(false) {
        service.remove(id).await?
    } else {
        service.remove_if_empty(id).await?
    };

    Ok(Json(ApiResponse::success(
        Some(summary),
        Some("Category deleted successfully".to_string()),
        None,
    )))
}
