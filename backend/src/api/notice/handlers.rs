//! HTTP handlers for notice management.

use axum::extract::{Extension, Path, Query};
use axum::Json;

use crate::api::common::AppContext;
use crate::auth::checker::AuthorityChecker;
use crate::auth::models::AccessTokenClaims;
use crate::database::models::Authority;
use crate::domain::notice::{NoticeCreate, NoticeResponse};
use crate::errors::ServiceError;
use crate::services::notice_service;
use crate::services::{PageRequest, PageResponse};

pub async fn get_notice(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
    Path(id): Path<i64>,
) -> Result<Json<NoticeResponse>, ServiceError> {
    AuthorityChecker::new([Authority::NoticeView]).check(&claims)?;
    let notice = notice_service::get_notice(ctx.database.readonly_pool(), id).await?;
    Ok(Json(notice))
}

pub async fn get_notices(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
    Query(page): Query<PageRequest>,
) -> Result<Json<PageResponse<NoticeResponse>>, ServiceError> {
    AuthorityChecker::new([Authority::NoticeView]).check(&claims)?;
    let notices = notice_service::get_notices(ctx.database.readonly_pool(), page).await?;
    Ok(Json(notices))
}

pub async fn create_notice(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
    Json(data): Json<NoticeCreate>,
) -> Result<Json<NoticeResponse>, ServiceError> {
    AuthorityChecker::new([Authority::NoticeEdit]).check(&claims)?;
    let mut uow = ctx.notice_uow();
    let notice = notice_service::create_notice(&mut uow, &claims, data).await?;
    Ok(Json(notice))
}

pub async fn update_notice(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
    Path(id): Path<i64>,
    Json(data): Json<NoticeCreate>,
) -> Result<Json<NoticeResponse>, ServiceError> {
    AuthorityChecker::new([Authority::NoticeEdit]).check(&claims)?;
    let mut uow = ctx.notice_uow();
    let notice = notice_service::update_notice(&mut uow, &claims, id, data).await?;
    Ok(Json(notice))
}

pub async fn remove_notice(
    Extension(ctx): Extension<AppContext>,
    Extension(claims): Extension<AccessTokenClaims>,
    Path(id): Path<i64>,
) -> Result<Json<NoticeResponse>, ServiceError> {
    AuthorityChecker::new([Authority::NoticeEdit]).check(&claims)?;
    let mut uow = ctx.notice_uow();
    let notice = notice_service::remove_notice(&mut uow, &claims, id).await?;
    Ok(Json(notice))
}
