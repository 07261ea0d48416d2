//! Middleware for protecting authenticated routes.
//!
//! Validates the bearer access token on every protected request and stores
//! the decoded claims in the request extensions for handlers to consume.
//! Fine-grained authority checks happen per handler via
//! [`crate::auth::checker::AuthorityChecker`].

use crate::api::common::error_response;
use crate::auth::checker::AuthorityChecker;
use crate::auth::token::TokenService;
use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// JWT authentication middleware.
///
/// On success the decoded [`crate::auth::models::AccessTokenClaims`] are
/// inserted into the request extensions. Failures are rendered through the
/// standard envelope, including the renew hint header on expired tokens.
pub async fn jwt_auth(
    Extension(tokens): Extension<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Response {
    match AuthorityChecker::any().authorize(&tokens, request.headers()) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(error) => error_response(error),
    }
}
