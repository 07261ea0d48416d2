//! HTTP handlers for user account management and session endpoints.

use axum::extract::{Extension, Path, Query};
use axum::http::HeaderMap;
use axum::Json;

use crate::api::common::AppContext;
use crate::auth::checker::{AUTHORIZATION_R, AuthorityChecker, bearer_credentials};
use crate::auth::models::{AccessTokenClaims, TokenPair};
use crate::database::models::Authority;
use crate::domain::user::{UserChangePassword, UserCreate, UserLogin, UserResponse, UserUpdate};
use crate::errors::ServiceError;
use crate::services::user_service;
use crate::services::{PageRequest, PageResponse};

pub async fn login(
    Extension(ctx): Extension<AppContext>,
    Json(data): Json<UserLogin>,
) -> Result<Json<TokenPair>, ServiceError> {
    let mut uow = ctx.user_uow();
    let pair = user_service::login(&mut uow, &ctx.tokens, data).await?;
    Ok(Json(pair))
}

pub async fn logout(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
) -> Result<Json<()>, ServiceError> {
    let mut uow = ctx.user_uow();
    user_service::logout(&mut uow, &claims).await?;
    Ok(Json(()))
}

pub async fn renew_token(
    Extension(ctx): Extension<AppContext>,
    headers: HeaderMap,
) -> Result<Json<TokenPair>, ServiceError> {
    let refresh_token = bearer_credentials(&headers, AUTHORIZATION_R)?;
    let mut uow = ctx.user_uow();
    let pair = user_service::renew_token(&mut uow, &ctx.tokens, &refresh_token).await?;
    Ok(Json(pair))
}

pub async fn get_user(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ServiceError> {
    AuthorityChecker::new([Authority::UserView]).check(&claims)?;
    let user = user_service::get_user(ctx.database.readonly_pool(), id).await?;
    Ok(Json(user))
}

pub async fn get_users(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
    Query(page): Query<PageRequest>,
) -> Result<Json<PageResponse<UserResponse>>, ServiceError> {
    AuthorityChecker::new([Authority::UserView]).check(&claims)?;
    let users = user_service::get_users(ctx.database.readonly_pool(), page).await?;
    Ok(Json(users))
}

pub async fn create_user(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
    Json(data): Json<UserCreate>,
) -> Result<Json<UserResponse>, ServiceError> {
    AuthorityChecker::new([Authority::UserEdit]).check(&claims)?;
    let mut uow = ctx.user_uow();
    let user = user_service::create_user(&mut uow, &claims, data).await?;
    Ok(Json(user))
}

pub async fn update_user(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
    Path(id): Path<i64>,
    Json(data): Json<UserUpdate>,
) -> Result<Json<UserResponse>, ServiceError> {
    AuthorityChecker::new([Authority::UserEdit]).check(&claims)?;
    let mut uow = ctx.user_uow();
    let user = user_service::update_user(&mut uow, &claims, id, data).await?;
    Ok(Json(user))
}

pub async fn remove_user(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ServiceError> {
    AuthorityChecker::new([Authority::UserEdit]).check(&claims)?;
    let mut uow = ctx.user_uow();
    let user = user_service::remove_user(&mut uow, &claims, id).await?;
    Ok(Json(user))
}

/// Administrative reset; the reset notification handler mails the account.
pub async fn reset_password(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ServiceError> {
    AuthorityChecker::new([Authority::UserEdit]).check(&claims)?;
    let mut uow = ctx.user_uow();
    let user = user_service::reset_password(&mut uow, &claims, id).await?;
    Ok(Json(user))
}

/// A user changing their own password.
pub async fn change_password(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
    Json(data): Json<UserChangePassword>,
) -> Result<Json<UserResponse>, ServiceError> {
    let mut uow = ctx.user_uow();
    let user = user_service::change_password(&mut uow, &claims, data).await?;
    Ok(Json(user))
}
