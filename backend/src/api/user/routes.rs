//! Route table for user endpoints.

use axum::Router;
use axum::routing::{get, post, put};

use crate::api::user::handlers;

/// Endpoints reachable without an access token.
pub fn public_routes() -> Router {
    Router::new()
        .route("/user/login", post(handlers::login))
        .route("/user/renew", post(handlers::renew_token))
}

/// Endpoints behind the JWT middleware.
pub fn protected_routes() -> Router {
    Router::new()
        .route("/users", get(handlers::get_users))
        .route("/user", post(handlers::create_user))
        .route("/user/password", put(handlers::change_password))
        .route("/user/logout", post(handlers::logout))
        .route(
            "/user/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::remove_user),
        )
        .route("/user/{id}/password-reset", post(handlers::reset_password))
}
