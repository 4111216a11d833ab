use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::features::brands::handlers;
use crate::features::brands::services::BrandService;

pub fn public_routes(service: Arc<BrandService>) -> Router {
    Router::new()
        .route("/brands", get(handlers::list_brands))
        .route("/brands/{id}", get(handlers::get_brand))
        .with_state(service)
}

/// Brand mutations (require JWT authentication)
pub fn protected_routes(service: Arc<BrandService>) -> Router {
    Router::new()
        .route("/brands", post(handlers::create_brand))
        .route(
            "/brands/{id}",
            patch(handlers::update_brand).delete(handlers::delete_brand),
        )
        .with_state(service)
}
