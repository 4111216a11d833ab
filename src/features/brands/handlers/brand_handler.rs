use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppQuery;
use crate::features::auth::guards::RequireAdmin;
use crate::features::brands::dtos::{
    BrandFormDto, BrandListQuery, BrandResponseDto, CreateBrandDto, UpdateBrandDto,
};
use crate::features::brands::services::BrandService;
use crate::shared::cascade::CascadeSummary;
use crate::shared::multipart::MultipartForm;
use crate::shared::types::{ApiResponse, Meta};

/// List brands, optionally limited to one category
#[utoipa::path(
    get,
    path = "/brands",
    params(BrandListQuery),
    responses(
        (status = 200, description = "List of brands", body = ApiResponse<Vec<BrandResponseDto>>),
        (status = 400, description = "Invalid query parameters"),
    ),
    tag = "brands"
)]
pub async fn list_brands(
    State(service): State<Arc<BrandService>>,
    AppQuery(query): AppQuery<BrandListQuery>,
) -> Result<Json<ApiResponse<Vec<BrandResponseDto>>>> {
    let brands = match query.category_id {
        Some(category_id) => service.find_by_category(category_id).await?,
        None => service.find_all().await?,
    };

    let total = brands.len();
    Ok(Json(ApiResponse::success(
        Some(brands),
        None,
        Some(Meta::total(total)),
    )))
}

/// Get brand by id with its category and products
#[utoipa::path(
    get,
    path = "/brands/{id}",
    params(
        ("id" = i32, Path, description = "Brand id")
    ),
    responses(
        (status = 200, description = "Brand found", body = ApiResponse<BrandResponseDto>),
        (status = 404, description = "Brand not found")
    ),
    tag = "brands"
)]
pub async fn get_brand(
    State(service): State<Arc<BrandService>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<BrandResponseDto>>> {
    let brand = service.find_one(id, true).await?;
    Ok(Json(ApiResponse::success(Some(brand), None, None)))
}

/// Create a brand inside an existing category
#[utoipa::path(
    post,
    path = "/brands",
    request_body(
        content = BrandFormDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 201, description = "Brand created", body = ApiResponse<BrandResponseDto>),
        (status = 400, description = "Invalid form or image"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Name already taken")
    ),
    tag = "brands",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_brand(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<BrandService>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<BrandResponseDto>>)> {
    let form = MultipartForm::read(multipart).await?;
    let dto = CreateBrandDto::from_form(&form)?;
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let brand = service.create(dto, form.into_files()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(brand), None, None)),
    ))
}

/// Update a brand; uploaded images replace the existing ones
#[utoipa::path(
    patch,
    path = "/brands/{id}",
    params(
        ("id" = i32, Path, description = "Brand id")
    ),
    request_body(
        content = BrandFormDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 200, description = "Brand updated", body = ApiResponse<BrandResponseDto>),
        (status = 400, description = "Invalid form or image"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Brand or category not found"),
        (status = 409, description = "Name already taken")
    ),
    tag = "brands",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_brand(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<BrandService>>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<BrandResponseDto>>> {
    let form = MultipartForm::read(multipart).await?;
    let dto = UpdateBrandDto::from_form(&form)?;
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let brand = service.update(id, dto, form.into_files()).await?;
    Ok(Json(ApiResponse::success(Some(brand), None, None)))
}

/// Delete a brand and all of its products
#[utoipa::path(
    delete,
    path = "/brands/{id}",
    params(
        ("id" = i32, Path, description = "Brand id")
    ),
    responses(
        (status = 200, description = "Brand deleted", body = ApiResponse<CascadeSummary>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Brand not found")
    ),
    tag = "brands",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_brand(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<BrandService>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<CascadeSummary>>> {
    let summary = service.remove(id).await?;
    Ok(Json(ApiResponse::success(
        Some(summary),
        Some("Brand deleted successfully".to_string()),
        None,
    )))
}
