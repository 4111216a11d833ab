use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::brands::{dtos as brands_dtos, handlers as brands_handlers};
use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers};
use crate::features::products::{dtos as products_dtos, handlers as products_handlers};
use crate::shared::cascade::CascadeSummary;
use crate::shared::types::{ApiResponse, MessageDto, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::login,
        auth::handlers::register,
        auth::handlers::get_profile,
        auth::handlers::update_profile,
        auth::handlers::list_users,
        auth::handlers::get_user,
        auth::handlers::update_user,
        auth::handlers::delete_user,
        // Categories
        categories_handlers::list_categories,
        categories_handlers::get_category,
        categories_handlers::create_category,
        categories_handlers::update_category,
        categories_handlers::delete_category,
        // Brands
        brands_handlers::list_brands,
        brands_handlers::get_brand,
        brands_handlers::create_brand,
        brands_handlers::update_brand,
        brands_handlers::delete_brand,
        // Products
        products_handlers::list_products,
        products_handlers::get_product,
        products_handlers::create_product,
        products_handlers::update_product,
        products_handlers::delete_product,
    ),
    components(
        schemas(
            // Shared
            Meta,
            MessageDto,
            CascadeSummary,
            ApiResponse<MessageDto>,
            ApiResponse<CascadeSummary>,
            // Auth
            auth::models::UserRole,
            auth::model::AuthenticatedUser,
            auth::dtos::LoginRequestDto,
            auth::dtos::RegisterRequestDto,
            auth::dtos::UpdateUserDto,
            auth::dtos::UserResponseDto,
            auth::dtos::AuthResponseDto,
            ApiResponse<auth::dtos::AuthResponseDto>,
            ApiResponse<auth::dtos::UserResponseDto>,
            ApiResponse<Vec<auth::dtos::UserResponseDto>>,
            // Categories
            categories_dtos::CategoryFormDto,
            categories_dtos::CategoryResponseDto,
            ApiResponse<Vec<categories_dtos::CategoryResponseDto>>,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            // Brands
            brands_dtos::BrandFormDto,
            brands_dtos::BrandResponseDto,
            ApiResponse<Vec<brands_dtos::BrandResponseDto>>,
            ApiResponse<brands_dtos::BrandResponseDto>,
            // Products
            products_dtos::ProductFormDto,
            products_dtos::ProductResponseDto,
            ApiResponse<Vec<products_dtos::ProductResponseDto>>,
            ApiResponse<products_dtos::ProductResponseDto>,
        )
    ),
    tags(
        (name = "auth", description = "Login and user administration"),
        (name = "categories", description = "Top-level catalog categories"),
        (name = "brands", description = "Brands within a category"),
        (name = "products", description = "Products within a brand"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Catalog API",
        version = "0.1.0",
        description = "Category, brand and product catalog administration",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
