//! Route table for notice endpoints.

use axum::Router;
use axum::routing::{get, post};

use crate::api::notice::handlers;

/// Endpoints behind the JWT middleware.
pub fn protected_routes() -> Router {
    Router::new()
        .route("/notices", get(handlers::get_notices))
        .route("/notice", post(handlers::create_notice))
        .route(
            "/notice/{id}",
            get(handlers::get_notice)
                .put(handlers::update_notice)
                .delete(handlers::remove_notice),
        )
}
