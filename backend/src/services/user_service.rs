//! Commands and queries for end-user accounts.
//!
//! The session protocol (login, logout, renewal) mirrors the admin one; the
//! user-specific command is the administrative password reset, which clears
//! the credential and triggers the reset notification.

use sqlx::SqlitePool;

use crate::auth::models::{AccessTokenClaims, TokenPair};
use crate::auth::token::TokenService;
use crate::domain::Operator;
use crate::domain::user::{
    User, UserChangePassword, UserCreate, UserLogin, UserResponse, UserUpdate,
};
use crate::errors::{Code, ServiceError, ServiceResult};
use crate::repositories::user_repository::UserRepository;
use crate::services::{PageRequest, PageResponse, validated};
use crate::uow::UnitOfWork;
use crate::utils::password::verify_password;

pub type UserUow = UnitOfWork<UserRepository>;

pub async fn create_user(
    uow: &mut UserUow,
    operator: &AccessTokenClaims,
    data: UserCreate,
) -> ServiceResult<UserResponse> {
    validated(&data)?;
    let scope = uow.autocommit().await?;
    let result: ServiceResult<UserResponse> = async {
        if UserRepository::login_id_exists(uow.session()?, &data.login_id, None).await? {
            return Err(ServiceError::bad_request(Code::AlreadyJoinedAccount));
        }
        let handle = uow.add(User::new(data, Operator::from(operator))?).await?;
        let snapshot = handle.lock().await.on_created();
        Ok(snapshot)
    }
    .await;
    uow.finish(scope, result).await
}

pub async fn update_user(
    uow: &mut UserUow,
    operator: &AccessTokenClaims,
    id: i64,
    data: UserUpdate,
) -> ServiceResult<UserResponse> {
    validated(&data)?;
    let scope = uow.autocommit().await?;
    let result: ServiceResult<UserResponse> = async {
        if UserRepository::login_id_exists(uow.session()?, &data.login_id, Some(id)).await? {
            return Err(ServiceError::bad_request(Code::AlreadyJoinedAccount));
        }
        let handle = uow
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::bad_request(Code::UnknownUser))?;
        let mut user = handle.lock().await;
        if user.removed_flag {
            return Err(ServiceError::bad_request(Code::UnknownUser));
        }
        user.update(data, Operator::from(operator));
        Ok(user.on_updated())
    }
    .await;
    uow.finish(scope, result).await
}

pub async fn remove_user(
    uow: &mut UserUow,
    operator: &AccessTokenClaims,
    id: i64,
) -> ServiceResult<UserResponse> {
    let scope = uow.autocommit().await?;
    let result: ServiceResult<UserResponse> = async {
        let handle = uow
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::bad_request(Code::UnknownUser))?;
        let mut user = handle.lock().await;
        if user.removed_flag {
            return Err(ServiceError::bad_request(Code::UnknownUser));
        }
        user.remove(Operator::from(operator));
        Ok(user.on_removed())
    }
    .await;
    uow.finish(scope, result).await
}

/// Administrative reset: clears the credential and the live session, then
/// notifies the account holder.
pub async fn reset_password(
    uow: &mut UserUow,
    operator: &AccessTokenClaims,
    id: i64,
) -> ServiceResult<UserResponse> {
    let scope = uow.autocommit().await?;
    let result: ServiceResult<UserResponse> = async {
        let handle = uow
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::bad_request(Code::UnknownUser))?;
        let mut user = handle.lock().await;
        if user.removed_flag {
            return Err(ServiceError::bad_request(Code::UnknownUser));
        }
        user.reset_password(Operator::from(operator));
        Ok(user.on_password_reset())
    }
    .await;
    uow.finish(scope, result).await
}

/// Changes the caller's own password after re-verifying the old one.
pub async fn change_password(
    uow: &mut UserUow,
    operator: &AccessTokenClaims,
    data: UserChangePassword,
) -> ServiceResult<UserResponse> {
    validated(&data)?;
    let scope = uow.autocommit().await?;
    let result: ServiceResult<UserResponse> = async {
        let handle = uow
            .get(operator.id)
            .await?
            .ok_or_else(|| ServiceError::bad_request(Code::UnknownUser))?;
        let mut user = handle.lock().await;
        if user.removed_flag {
            return Err(ServiceError::bad_request(Code::UnknownUser));
        }
        let stored = user
            .password
            .clone()
            .ok_or_else(|| ServiceError::bad_request(Code::UnjoinedAccount))?;
        if !verify_password(&data.old_password, &stored) {
            return Err(ServiceError::bad_request(Code::InvalidPassword));
        }
        if verify_password(&data.new_password, &stored) {
            return Err(ServiceError::bad_request(Code::ChangeToSamePassword));
        }
        user.change_password(&data.new_password, Operator::from(operator))?;
        Ok(user.on_updated())
    }
    .await;
    uow.finish(scope, result).await
}

pub async fn login(
    uow: &mut UserUow,
    tokens: &TokenService,
    data: UserLogin,
) -> ServiceResult<TokenPair> {
    validated(&data)?;
    let scope = uow.autocommit().await?;
    let result: ServiceResult<TokenPair> = async {
        let user = UserRepository::find_by_login_id(uow.session()?, &data.login_id)
            .await?
            .ok_or_else(|| ServiceError::bad_request(Code::UnjoinedAccount))?;
        if user.removed_flag {
            return Err(ServiceError::bad_request(Code::UnjoinedAccount));
        }
        if !user.use_flag {
            return Err(ServiceError::bad_request(Code::InvalidAccess));
        }
        let stored = user
            .password
            .clone()
            .ok_or_else(|| ServiceError::bad_request(Code::UnjoinedAccount))?;
        if !verify_password(&data.password, &stored) {
            return Err(ServiceError::bad_request(Code::InvalidPassword));
        }

        let handle = uow.track(user);
        let mut user = handle.lock().await;
        let access_token = tokens.issue_access_token(&user.access_claims())?;
        let refresh_token = tokens.issue_refresh_token(&user.refresh_claims())?;
        user.renew_token(refresh_token.clone());
        user.on_logged_in();
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
    .await;
    uow.finish(scope, result).await
}

pub async fn logout(uow: &mut UserUow, operator: &AccessTokenClaims) -> ServiceResult<()> {
    let scope = uow.autocommit().await?;
    let result: ServiceResult<()> = async {
        if let Some(handle) = uow.get(operator.id).await? {
            handle.lock().await.logout();
        }
        Ok(())
    }
    .await;
    uow.finish(scope, result).await
}

/// Refresh-token exchange with the same rotation and grace semantics as the
/// admin renewal.
pub async fn renew_token(
    uow: &mut UserUow,
    tokens: &TokenService,
    refresh_token: &str,
) -> ServiceResult<TokenPair> {
    let claims = tokens.decode_refresh(refresh_token)?;
    let scope = uow.autocommit().await?;
    let result: ServiceResult<TokenPair> = async {
        let handle = uow
            .get(claims.id)
            .await?
            .ok_or_else(ServiceError::unauthorized)?;
        let mut user = handle.lock().await;
        if user.removed_flag || !user.use_flag {
            return Err(ServiceError::unauthorized());
        }
        let stored = user.token.clone().ok_or_else(ServiceError::unauthorized)?;
        if !tokens.is_valid(&stored) {
            return Err(ServiceError::unauthorized());
        }

        let access_token = tokens.issue_access_token(&user.access_claims())?;
        if tokens.issued_within_grace_window(&stored) {
            return Ok(TokenPair {
                access_token,
                refresh_token: stored,
            });
        }
        if refresh_token != stored {
            return Err(ServiceError::unauthorized());
        }
        let rotated = tokens.issue_refresh_token(&user.refresh_claims())?;
        user.renew_token(rotated.clone());
        Ok(TokenPair {
            access_token,
            refresh_token: rotated,
        })
    }
    .await;
    uow.finish(scope, result).await
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> ServiceResult<UserResponse> {
    UserRepository::find_response(pool, id)
        .await?
        .ok_or_else(|| ServiceError::bad_request(Code::UnknownUser))
}

pub async fn get_users(
    pool: &SqlitePool,
    page: PageRequest,
) -> ServiceResult<PageResponse<UserResponse>> {
    let total = UserRepository::count(pool).await?;
    let items = UserRepository::list(pool, page.offset(), page.limit()).await?;
    Ok(PageResponse::new(&page, total, items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::UserType;
    use crate::events::EventHandlerRegistry;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::time::Duration;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn uow(pool: &SqlitePool) -> UserUow {
        UserUow::new(pool.clone(), Arc::new(EventHandlerRegistry::builder().build()))
    }

    fn tokens() -> TokenService {
        TokenService::with_params(
            "test-secret",
            Duration::from_secs(300),
            Duration::from_secs(1800),
            Duration::from_secs(10),
            true,
        )
    }

    fn admin_claims() -> AccessTokenClaims {
        AccessTokenClaims {
            id: 99,
            login_id: "manager@example.com".into(),
            name: "Manager".into(),
            user_type: UserType::Admin,
            manager_flag: true,
            authorities: BTreeSet::new(),
        }
    }

    fn create_data(login_id: &str) -> UserCreate {
        UserCreate {
            login_id: login_id.into(),
            password: "correct horse".into(),
            name: "User".into(),
            use_flag: true,
            authorities: BTreeSet::new(),
        }
    }

    #[tokio::test]
    async fn reset_password_blocks_login_until_rejoined() {
        let pool = test_pool().await;
        let mut uow = uow(&pool);
        let svc = tokens();
        let created = create_user(&mut uow, &admin_claims(), create_data("user@example.com"))
            .await
            .unwrap();

        login(
            &mut uow,
            &svc,
            UserLogin {
                login_id: "user@example.com".into(),
                password: "correct horse".into(),
            },
        )
        .await
        .unwrap();

        reset_password(&mut uow, &admin_claims(), created.id)
            .await
            .unwrap();

        let result = login(
            &mut uow,
            &svc,
            UserLogin {
                login_id: "user@example.com".into(),
                password: "correct horse".into(),
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(ServiceError::BadRequest {
                code: Code::UnjoinedAccount
            })
        ));
    }

    #[tokio::test]
    async fn login_failures_are_bad_requests() {
        let pool = test_pool().await;
        let mut uow = uow(&pool);
        let svc = tokens();
        let created = create_user(&mut uow, &admin_claims(), create_data("user@example.com"))
            .await
            .unwrap();

        let result = login(
            &mut uow,
            &svc,
            UserLogin {
                login_id: "nobody@example.com".into(),
                password: "correct horse".into(),
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(ServiceError::BadRequest {
                code: Code::UnjoinedAccount
            })
        ));

        update_user(
            &mut uow,
            &admin_claims(),
            created.id,
            UserUpdate {
                login_id: "user@example.com".into(),
                name: "User".into(),
                use_flag: false,
                authorities: BTreeSet::new(),
            },
        )
        .await
        .unwrap();
        let result = login(
            &mut uow,
            &svc,
            UserLogin {
                login_id: "user@example.com".into(),
                password: "correct horse".into(),
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(ServiceError::BadRequest {
                code: Code::InvalidAccess
            })
        ));
    }

    #[tokio::test]
    async fn removed_user_vanishes_from_queries() {
        let pool = test_pool().await;
        let mut uow = uow(&pool);
        let created = create_user(&mut uow, &admin_claims(), create_data("user@example.com"))
            .await
            .unwrap();

        remove_user(&mut uow, &admin_claims(), created.id)
            .await
            .unwrap();

        assert!(matches!(
            get_user(&pool, created.id).await,
            Err(ServiceError::BadRequest {
                code: Code::UnknownUser
            })
        ));
        let listed = get_users(&pool, PageRequest::default()).await.unwrap();
        assert_eq!(listed.total, 0);
    }

    #[tokio::test]
    async fn user_renewal_rotates_like_admin_renewal() {
        let pool = test_pool().await;
        let mut uow = uow(&pool);
        let svc = tokens();
        let created = create_user(&mut uow, &admin_claims(), create_data("user@example.com"))
            .await
            .unwrap();
        let pair = login(
            &mut uow,
            &svc,
            UserLogin {
                login_id: "user@example.com".into(),
                password: "correct horse".into(),
            },
        )
        .await
        .unwrap();

        let renewed = renew_token(&mut uow, &svc, &pair.refresh_token).await.unwrap();
        let stored: Option<String> = sqlx::query_scalar("SELECT token FROM user WHERE id = ?")
            .bind(created.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stored, Some(renewed.refresh_token));
    }
}
