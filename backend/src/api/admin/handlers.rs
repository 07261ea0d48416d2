//! HTTP handlers for admin account management and session endpoints.

use axum::extract::{Extension, Path, Query};
use axum::http::HeaderMap;
use axum::Json;

use crate::api::common::AppContext;
use crate::auth::checker::{AUTHORIZATION_R, AuthorityChecker, bearer_credentials};
use crate::auth::models::{AccessTokenClaims, TokenPair};
use crate::database::models::Authority;
use crate::domain::admin::{
    AdminChangePassword, AdminCreate, AdminLogin, AdminResponse, AdminUpdate, AdminVerify,
};
use crate::errors::ServiceError;
use crate::services::admin_service;
use crate::services::{PageRequest, PageResponse};

pub async fn login(
    Extension(ctx): Extension<AppContext>,
    Json(data): Json<AdminLogin>,
) -> Result<Json<TokenPair>, ServiceError> {
    let mut uow = ctx.admin_uow();
    let pair = admin_service::login(&mut uow, &ctx.tokens, data).await?;
    Ok(Json(pair))
}

/// Claims an invited account with its verification token; public because the
/// invitee has no session yet.
pub async fn verify_admin(
    Extension(ctx): Extension<AppContext>,
    Path(id): Path<i64>,
    Json(data): Json<AdminVerify>,
) -> Result<Json<TokenPair>, ServiceError> {
    let mut uow = ctx.admin_uow();
    let pair = admin_service::verify_admin(&mut uow, &ctx.tokens, id, data).await?;
    Ok(Json(pair))
}

pub async fn logout(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
) -> Result<Json<()>, ServiceError> {
    let mut uow = ctx.admin_uow();
    admin_service::logout(&mut uow, &claims).await?;
    Ok(Json(()))
}

/// Renewal reads the refresh token from its own header so the (possibly
/// expired) access token in `Authorization` is left untouched.
pub async fn renew_token(
    Extension(ctx): Extension<AppContext>,
    headers: HeaderMap,
) -> Result<Json<TokenPair>, ServiceError> {
    let refresh_token = bearer_credentials(&headers, AUTHORIZATION_R)?;
    let mut uow = ctx.admin_uow();
    let pair = admin_service::renew_token(&mut uow, &ctx.tokens, &refresh_token).await?;
    Ok(Json(pair))
}

pub async fn get_admin(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
    Path(id): Path<i64>,
) -> Result<Json<AdminResponse>, ServiceError> {
    AuthorityChecker::new([Authority::AdminView]).check(&claims)?;
    let admin = admin_service::get_admin(ctx.database.readonly_pool(), id).await?;
    Ok(Json(admin))
}

pub async fn get_admins(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
    Query(page): Query<PageRequest>,
) -> Result<Json<PageResponse<AdminResponse>>, ServiceError> {
    AuthorityChecker::new([Authority::AdminView]).check(&claims)?;
    let admins = admin_service::get_admins(ctx.database.readonly_pool(), page).await?;
    Ok(Json(admins))
}

pub async fn create_admin(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
    Json(data): Json<AdminCreate>,
) -> Result<Json<AdminResponse>, ServiceError> {
    AuthorityChecker::new([Authority::AdminEdit]).check(&claims)?;
    let mut uow = ctx.admin_uow();
    let admin = admin_service::create_admin(&mut uow, &claims, data).await?;
    Ok(Json(admin))
}

pub async fn update_admin(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
    Path(id): Path<i64>,
    Json(data): Json<AdminUpdate>,
) -> Result<Json<AdminResponse>, ServiceError> {
    AuthorityChecker::new([Authority::AdminEdit]).check(&claims)?;
    let mut uow = ctx.admin_uow();
    let admin = admin_service::update_admin(&mut uow, &claims, id, data).await?;
    Ok(Json(admin))
}

/// Removing an admin account is reserved for managers.
pub async fn remove_admin(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
    Path(id): Path<i64>,
) -> Result<Json<AdminResponse>, ServiceError> {
    AuthorityChecker::manager_only().check(&claims)?;
    let mut uow = ctx.admin_uow();
    let admin = admin_service::remove_admin(&mut uow, &claims, id).await?;
    Ok(Json(admin))
}

pub async fn change_password(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
    Json(data): Json<AdminChangePassword>,
) -> Result<Json<AdminResponse>, ServiceError> {
    let mut uow = ctx.admin_uow();
    let admin = admin_service::change_password(&mut uow, &claims, data).await?;
    Ok(Json(admin))
}
