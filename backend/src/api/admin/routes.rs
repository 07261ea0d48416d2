//! Route table for admin endpoints.

use axum::Router;
use axum::routing::{get, post, put};

use crate::api::admin::handlers;

/// Endpoints reachable without an access token.
pub fn public_routes() -> Router {
    Router::new()
        .route("/admin/login", post(handlers::login))
        .route("/admin/renew", post(handlers::renew_token))
        .route("/admin/{id}/verify", post(handlers::verify_admin))
}

/// Endpoints behind the JWT middleware.
pub fn protected_routes() -> Router {
    Router::new()
        .route("/admins", get(handlers::get_admins))
        .route("/admin", post(handlers::create_admin))
        .route("/admin/password", put(handlers::change_password))
        .route("/admin/logout", post(handlers::logout))
        .route(
            "/admin/{id}",
            get(handlers::get_admin)
                .put(handlers::update_admin)
                .delete(handlers::remove_admin),
        )
}
