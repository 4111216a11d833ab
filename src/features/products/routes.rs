use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::features::products::handlers;
use crate::features::products::services::ProductService;

pub fn public_routes(service: Arc<ProductService>) -> Router {
    Router::new()
        .route("/products", get(handlers::list_products))
        .route("/products/{id}", get(handlers::get_product))
        .with_state(service)
}

pub fn protected_routes(service: Arc<ProductService>) -> Router {
    Router::new()
        .route("/products", post(handlers::create_product))
        .route(
            "/products/{id}",
            patch(handlers::update_product).delete(handlers::delete_product),
        )
        .with_state(service)
}
