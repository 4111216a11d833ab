use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::features::categories::handlers;
use crate::features::categories::services::CategoryService;

/// Public read-only category routes
pub fn public_routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route("/categories", get(handlers::list_categories))
        .route("/categories/{id}", get(handlers::get_category))
        .with_state(service)
}

/// Category mutations (require JWT authentication)
pub fn protected_routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route("/categories", post(handlers::create_category))
        .route(
            "/categories/{id}",
            patch(handlers::update_category).delete(handlers::delete_category),
        )
        .with_state(service)
}
