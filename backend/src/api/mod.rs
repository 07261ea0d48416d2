//! HTTP surface: routers, handlers and the shared response envelope.

pub mod admin;
pub mod common;
pub mod notice;
pub mod user;

use axum::extract::Extension;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;

use crate::api::common::AppContext;
use crate::auth::middleware::jwt_auth;
use crate::auth::token::TokenService;

async fn health() -> &'static str {
    "ok"
}

/// Assembles the full application router.
pub fn app_router(ctx: AppContext, tokens: Arc<TokenService>) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .merge(admin::routes::public_routes())
        .merge(user::routes::public_routes());

    let protected = Router::new()
        .merge(admin::routes::protected_routes())
        .merge(user::routes::protected_routes())
        .merge(notice::routes::protected_routes())
        .layer(middleware::from_fn(jwt_auth));

    Router::new().nest("/api", public.merge(protected)).layer(
        ServiceBuilder::new()
            .layer(Extension(ctx))
            .layer(Extension(tokens)),
    )
}
