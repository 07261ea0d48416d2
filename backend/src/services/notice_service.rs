//! Commands and queries for notices.

use sqlx::SqlitePool;

use crate::auth::models::AccessTokenClaims;
use crate::domain::Operator;
use crate::domain::notice::{Notice, NoticeCreate, NoticeResponse};
use crate::errors::{Code, ServiceError, ServiceResult};
use crate::repositories::notice_repository::NoticeRepository;
use crate::services::{PageRequest, PageResponse, validated};
use crate::uow::UnitOfWork;

pub type NoticeUow = UnitOfWork<NoticeRepository>;

pub async fn create_notice(
    uow: &mut NoticeUow,
    operator: &AccessTokenClaims,
    data: NoticeCreate,
) -> ServiceResult<NoticeResponse> {
    validated(&data)?;
    let scope = uow.autocommit().await?;
    let result: ServiceResult<NoticeResponse> = async {
        let handle = uow.add(Notice::new(data, operator.id)).await?;
        let snapshot = handle.lock().await.on_created();
        Ok(snapshot)
    }
    .await;
    uow.finish(scope, result).await
}

pub async fn update_notice(
    uow: &mut NoticeUow,
    operator: &AccessTokenClaims,
    id: i64,
    data: NoticeCreate,
) -> ServiceResult<NoticeResponse> {
    validated(&data)?;
    let scope = uow.autocommit().await?;
    let result: ServiceResult<NoticeResponse> = async {
        let handle = uow
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::bad_request(Code::UnknownNotice))?;
        let mut notice = handle.lock().await;
        if notice.removed_flag {
            return Err(ServiceError::bad_request(Code::UnknownNotice));
        }
        notice.update(data, Operator::from(operator));
        Ok(notice.on_updated())
    }
    .await;
    uow.finish(scope, result).await
}

pub async fn remove_notice(
    uow: &mut NoticeUow,
    operator: &AccessTokenClaims,
    id: i64,
) -> ServiceResult<NoticeResponse> {
    let scope = uow.autocommit().await?;
    let result: ServiceResult<NoticeResponse> = async {
        let handle = uow
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::bad_request(Code::UnknownNotice))?;
        let mut notice = handle.lock().await;
        if notice.removed_flag {
            return Err(ServiceError::bad_request(Code::UnknownNotice));
        }
        notice.remove(operator.id);
        Ok(notice.on_removed())
    }
    .await;
    uow.finish(scope, result).await
}

pub async fn get_notice(pool: &SqlitePool, id: i64) -> ServiceResult<NoticeResponse> {
    NoticeRepository::find_response(pool, id)
        .await?
        .ok_or_else(|| ServiceError::bad_request(Code::UnknownNotice))
}

pub async fn get_notices(
    pool: &SqlitePool,
    page: PageRequest,
) -> ServiceResult<PageResponse<NoticeResponse>> {
    let total = NoticeRepository::count(pool).await?;
    let items = NoticeRepository::list(pool, page.offset(), page.limit()).await?;
    Ok(PageResponse::new(&page, total, items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::UserType;
    use crate::events::EventHandlerRegistry;
    use crate::events::handlers::AuditLogHandler;
    use crate::domain::event::EventKind;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn operator() -> AccessTokenClaims {
        AccessTokenClaims {
            id: 99,
            login_id: "manager@example.com".into(),
            name: "Manager".into(),
            user_type: UserType::Admin,
            manager_flag: true,
            authorities: BTreeSet::new(),
        }
    }

    fn data(title: &str) -> NoticeCreate {
        NoticeCreate {
            title: title.into(),
            body: "body".into(),
            use_flag: true,
        }
    }

    #[tokio::test]
    async fn full_lifecycle_leaves_an_audit_trail() {
        let pool = test_pool().await;
        let registry = Arc::new(
            EventHandlerRegistry::builder()
                .on(EventKind::NoticeCreated, Arc::new(AuditLogHandler))
                .on(EventKind::NoticeUpdated, Arc::new(AuditLogHandler))
                .on(EventKind::NoticeRemoved, Arc::new(AuditLogHandler))
                .build(),
        );
        let mut uow = NoticeUow::new(pool.clone(), registry);

        let created = create_notice(&mut uow, &operator(), data("maintenance"))
            .await
            .unwrap();
        update_notice(&mut uow, &operator(), created.id, data("maintenance moved"))
            .await
            .unwrap();
        remove_notice(&mut uow, &operator(), created.id)
            .await
            .unwrap();

        let audits: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM audit_log WHERE entity = 'notice'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(audits, 3);
        assert!(matches!(
            get_notice(&pool, created.id).await,
            Err(ServiceError::BadRequest {
                code: Code::UnknownNotice
            })
        ));
    }

    #[tokio::test]
    async fn blank_title_is_an_invalid_parameter() {
        let pool = test_pool().await;
        let mut uow = NoticeUow::new(
            pool,
            Arc::new(EventHandlerRegistry::builder().build()),
        );
        let result = create_notice(&mut uow, &operator(), data("")).await;
        assert!(matches!(
            result,
            Err(ServiceError::BadRequest {
                code: Code::InvalidParameter
            })
        ));
    }
}
