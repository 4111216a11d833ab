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
use crate::features::products::dtos::{
    CreateProductDto, ProductFilter, ProductFormDto, ProductResponseDto, UpdateProductDto,
};
use crate::features::products::services::ProductService;
use crate::shared::cascade::CascadeSummary;
use crate::shared::multipart::MultipartForm;
use crate::shared::types::{ApiResponse, Meta};

/// List products, newest first
#[utoipa::path(
    get,
    path = "/products",
    params(ProductFilter),
    responses(
        (status = 200, description = "List of products", body = ApiResponse<Vec<ProductResponseDto>>),
        (status = 400, description = "Invalid query parameters"),
    ),
    tag = "products"
)]
pub async fn list_products(
    State(service): State<Arc<ProductService>>,
    AppQuery(filter): AppQuery<ProductFilter>,
) -> Result<Json<ApiResponse<Vec<ProductResponseDto>>>> {
    let products = service.find_all(filter).await?;
    let total = products.len();
    Ok(Json(ApiResponse::success(
        Some(products),
        None,
        Some(Meta::total(total)),
    )))
}

/// Get product by id with its brand and category
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(
        ("id" = i32, Path, description = "Product id")
    ),
    responses(
        (status = 200, description = "Product found", body = ApiResponse<ProductResponseDto>),
        (status = 404, description = "Product not found")
    ),
    tag = "products"
)]
pub async fn get_product(
    State(service): State<Arc<ProductService>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ProductResponseDto>>> {
    let product = service.find_one(id).await?;
    Ok(Json(ApiResponse::success(Some(product), None, None)))
}

/// Create a product under an existing brand
#[utoipa::path(
    post,
    path = "/products",
    request_body(
        content = ProductFormDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 201, description = "Product created", body = ApiResponse<ProductResponseDto>),
        (status = 400, description = "Invalid form or image"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Brand not found"),
        (status = 409, description = "Name already used within the brand")
    ),
    tag = "products",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_product(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<ProductService>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponseDto>>)> {
    let form = MultipartForm::read(multipart).await?;
    let dto = CreateProductDto::from_form(&form)?;
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let product = service.create(dto, form.into_files()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(product), None, None)),
    ))
}

/// Update a product; uploaded images replace the existing ones
#[utoipa::path(
    patch,
    path = "/products/{id}",
    params(
        ("id" = i32, Path, description = "Product id")
    ),
    request_body(
        content = ProductFormDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<ProductResponseDto>),
        (status = 400, description = "Invalid form or image"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Product or brand not found"),
        (status = 409, description = "Name already used within the brand")
    ),
    tag = "products",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_product(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<ProductService>>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ProductResponseDto>>> {
    let form = MultipartForm::read(multipart).await?;
    let dto = UpdateProductDto::from_form(&form)?;
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let product = service.update(id, dto, form.into_files()).await?;
    Ok(Json(ApiResponse::success(Some(product), None, None)))
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(
        ("id" = i32, Path, description = "Product id")
    ),
    responses(
        (status = 200, description = "Product deleted", body = ApiResponse<CascadeSummary>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Product not found")
    ),
    tag = "products",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_product(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<ProductService>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<CascadeSummary>>> {
    let summary = service.remove(id).await?;
    Ok(Json(ApiResponse::success(
        Some(summary),
        Some("Product deleted successfully".to_string()),
        None,
    )))
}
