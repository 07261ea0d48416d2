//! Commands and queries for back-office admin accounts.
//!
//! Every command opens an autocommit scope on the caller's unit of work, so
//! single commands own their transaction while composed commands share the
//! caller's. Token renewal implements single-active-session rotation: the
//! stored refresh token is the one live session and renewal replaces it,
//! except inside the grace window where concurrent renewals must agree.

use sqlx::SqlitePool;

use crate::auth::models::{AccessTokenClaims, TokenPair};
use crate::auth::token::TokenService;
use crate::domain::Operator;
use crate::domain::admin::{
    Admin, AdminChangePassword, AdminCreate, AdminLogin, AdminResponse, AdminUpdate, AdminVerify,
};
use crate::errors::{Code, ServiceError, ServiceResult};
use crate::repositories::admin_repository::AdminRepository;
use crate::services::{PageRequest, PageResponse, validated};
use crate::uow::UnitOfWork;
use crate::utils::password::verify_password;

pub type AdminUow = UnitOfWork<AdminRepository>;

pub async fn create_admin(
    uow: &mut AdminUow,
    operator: &AccessTokenClaims,
    data: AdminCreate,
) -> ServiceResult<AdminResponse> {
    validated(&data)?;
    // Only a manager can mint another manager.
    if data.manager_flag && !operator.manager_flag {
        return Err(ServiceError::forbidden());
    }
    let scope = uow.autocommit().await?;
    let result: ServiceResult<AdminResponse> = async {
        if let Some(existing) =
            AdminRepository::find_by_login_id(uow.session()?, &data.login_id).await?
        {
            if existing.verify_flag || existing.removed_flag {
                return Err(ServiceError::bad_request(Code::AlreadyJoinedAccount));
            }
            // A pending invite is superseded by re-inviting the same login id.
            AdminRepository::delete(uow.session()?, existing.id).await?;
        }
        let handle = uow.add(Admin::new(data, operator.id)).await?;
        let snapshot = handle.lock().await.on_created();
        Ok(snapshot)
    }
    .await;
    uow.finish(scope, result).await
}

/// Claims an invited account: the presented verification token must match the
/// stored one, after which the invitee is logged in.
pub async fn verify_admin(
    uow: &mut AdminUow,
    tokens: &TokenService,
    id: i64,
    data: AdminVerify,
) -> ServiceResult<TokenPair> {
    validated(&data)?;
    let scope = uow.autocommit().await?;
    let result: ServiceResult<TokenPair> = async {
        let handle = uow
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::bad_request(Code::UnknownAdmin))?;
        let mut admin = handle.lock().await;
        if admin.removed_flag {
            return Err(ServiceError::bad_request(Code::UnknownAdmin));
        }
        if admin.verify_flag {
            return Err(ServiceError::bad_request(Code::AlreadyJoinedAccount));
        }
        if admin.verify_token.as_deref() != Some(data.verify_token.as_str()) {
            return Err(ServiceError::bad_request(Code::InvalidVerifyToken));
        }
        admin.verify(&data)?;
        admin.on_joined();
        let access_token = tokens.issue_access_token(&admin.access_claims())?;
        let refresh_token = tokens.issue_refresh_token(&admin.refresh_claims())?;
        admin.renew_token(refresh_token.clone());
        admin.on_logged_in();
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
    .await;
    uow.finish(scope, result).await
}

pub async fn update_admin(
    uow: &mut AdminUow,
    operator: &AccessTokenClaims,
    id: i64,
    data: AdminUpdate,
) -> ServiceResult<AdminResponse> {
    validated(&data)?;
    if operator.id == id {
        return Err(ServiceError::bad_request(Code::CannotUpdateYourself));
    }
    if data.manager_flag && !operator.manager_flag {
        return Err(ServiceError::forbidden());
    }
    let scope = uow.autocommit().await?;
    let result: ServiceResult<AdminResponse> = async {
        if AdminRepository::login_id_exists(uow.session()?, &data.login_id, Some(id)).await? {
            return Err(ServiceError::bad_request(Code::AlreadyJoinedAccount));
        }
        let handle = uow
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::bad_request(Code::UnknownAdmin))?;
        let mut admin = handle.lock().await;
        if admin.removed_flag {
            return Err(ServiceError::bad_request(Code::UnknownAdmin));
        }
        admin.update(data, Operator::from(operator));
        Ok(admin.on_updated())
    }
    .await;
    uow.finish(scope, result).await
}

pub async fn remove_admin(
    uow: &mut AdminUow,
    operator: &AccessTokenClaims,
    id: i64,
) -> ServiceResult<AdminResponse> {
    if operator.id == id {
        return Err(ServiceError::bad_request(Code::CannotRemoveYourself));
    }
    let scope = uow.autocommit().await?;
    let result: ServiceResult<AdminResponse> = async {
        let handle = uow
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::bad_request(Code::UnknownAdmin))?;
        let mut admin = handle.lock().await;
        if admin.removed_flag {
            return Err(ServiceError::bad_request(Code::UnknownAdmin));
        }
        admin.remove(operator.id);
        Ok(admin.on_removed())
    }
    .await;
    uow.finish(scope, result).await
}

/// Changes the caller's own password after re-verifying the old one.
pub async fn change_password(
    uow: &mut AdminUow,
    operator: &AccessTokenClaims,
    data: AdminChangePassword,
) -> ServiceResult<AdminResponse> {
    validated(&data)?;
    let scope = uow.autocommit().await?;
    let result: ServiceResult<AdminResponse> = async {
        let handle = uow
            .get(operator.id)
            .await?
            .ok_or_else(|| ServiceError::bad_request(Code::UnknownAdmin))?;
        let mut admin = handle.lock().await;
        if admin.removed_flag {
            return Err(ServiceError::bad_request(Code::UnknownAdmin));
        }
        let stored = admin
            .password
            .clone()
            .ok_or_else(|| ServiceError::bad_request(Code::UnjoinedAccount))?;
        if !verify_password(&data.old_password, &stored) {
            return Err(ServiceError::bad_request(Code::InvalidPassword));
        }
        if verify_password(&data.new_password, &stored) {
            return Err(ServiceError::bad_request(Code::ChangeToSamePassword));
        }
        admin.change_password(&data.new_password, Operator::from(operator))?;
        Ok(admin.on_password_changed())
    }
    .await;
    uow.finish(scope, result).await
}

/// Verifies credentials and starts the single active session.
pub async fn login(
    uow: &mut AdminUow,
    tokens: &TokenService,
    data: AdminLogin,
) -> ServiceResult<TokenPair> {
    validated(&data)?;
    let scope = uow.autocommit().await?;
    let result: ServiceResult<TokenPair> = async {
        let admin = AdminRepository::find_by_login_id(uow.session()?, &data.login_id)
            .await?
            .ok_or_else(|| ServiceError::bad_request(Code::UnjoinedAccount))?;
        if admin.removed_flag {
            return Err(ServiceError::bad_request(Code::UnjoinedAccount));
        }
        if !admin.verify_flag {
            return Err(ServiceError::bad_request(Code::NotVerifiedAccount));
        }
        if !admin.use_flag {
            return Err(ServiceError::bad_request(Code::InvalidAccess));
        }
        let stored = admin
            .password
            .clone()
            .ok_or_else(|| ServiceError::bad_request(Code::UnjoinedAccount))?;
        if !verify_password(&data.password, &stored) {
            return Err(ServiceError::bad_request(Code::InvalidPassword));
        }

        let handle = uow.track(admin);
        let mut admin = handle.lock().await;
        let access_token = tokens.issue_access_token(&admin.access_claims())?;
        let refresh_token = tokens.issue_refresh_token(&admin.refresh_claims())?;
        admin.renew_token(refresh_token.clone());
        admin.on_logged_in();
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
    .await;
    uow.finish(scope, result).await
}

/// Clears the stored session token; a second logout is a no-op.
pub async fn logout(uow: &mut AdminUow, operator: &AccessTokenClaims) -> ServiceResult<()> {
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

/// Exchanges a refresh token for a fresh pair.
///
/// The presented token must match the stored one, except when the stored
/// token was itself issued within the grace window: then a concurrent renewal
/// already rotated it and this call returns the stored token unchanged, so
/// racing clients converge on the same session token.
pub async fn renew_token(
    uow: &mut AdminUow,
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
        let mut admin = handle.lock().await;
        if admin.removed_flag || !admin.verify_flag || !admin.use_flag {
            return Err(ServiceError::unauthorized());
        }
        let stored = admin.token.clone().ok_or_else(ServiceError::unauthorized)?;
        if !tokens.is_valid(&stored) {
            return Err(ServiceError::unauthorized());
        }

        let access_token = tokens.issue_access_token(&admin.access_claims())?;
        if tokens.issued_within_grace_window(&stored) {
            return Ok(TokenPair {
                access_token,
                refresh_token: stored,
            });
        }
        if refresh_token != stored {
            return Err(ServiceError::unauthorized());
        }
        let rotated = tokens.issue_refresh_token(&admin.refresh_claims())?;
        admin.renew_token(rotated.clone());
        Ok(TokenPair {
            access_token,
            refresh_token: rotated,
        })
    }
    .await;
    uow.finish(scope, result).await
}

pub async fn get_admin(pool: &SqlitePool, id: i64) -> ServiceResult<AdminResponse> {
    AdminRepository::find_response(pool, id)
        .await?
        .ok_or_else(|| ServiceError::bad_request(Code::UnknownAdmin))
}

pub async fn get_admins(
    pool: &SqlitePool,
    page: PageRequest,
) -> ServiceResult<PageResponse<AdminResponse>> {
    let total = AdminRepository::count(pool).await?;
    let items = AdminRepository::list(pool, page.offset(), page.limit()).await?;
    Ok(PageResponse::new(&page, total, items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Authority, UserType};
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

    fn uow(pool: &SqlitePool) -> AdminUow {
        AdminUow::new(pool.clone(), Arc::new(EventHandlerRegistry::builder().build()))
    }

    fn tokens(refresh_ttl_secs: u64, test_mode: bool) -> TokenService {
        TokenService::with_params(
            "test-secret",
            Duration::from_secs(300),
            Duration::from_secs(refresh_ttl_secs),
            Duration::from_secs(10),
            test_mode,
        )
    }

    fn manager_claims(id: i64) -> AccessTokenClaims {
        AccessTokenClaims {
            id,
            login_id: "manager@example.com".into(),
            name: "Manager".into(),
            user_type: UserType::Admin,
            manager_flag: true,
            authorities: BTreeSet::new(),
        }
    }

    fn create_data(login_id: &str) -> AdminCreate {
        AdminCreate {
            login_id: login_id.into(),
            name: "Ops".into(),
            use_flag: true,
            manager_flag: false,
            authorities: BTreeSet::from([Authority::AdminView]),
        }
    }

    async fn verify_token_of(pool: &SqlitePool, id: i64) -> String {
        sqlx::query_scalar::<_, Option<String>>("SELECT verify_token FROM admin WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
            .unwrap()
            .unwrap()
    }

    /// Claims the invite with the password used by the login helpers.
    async fn join(uow: &mut AdminUow, svc: &TokenService, pool: &SqlitePool, id: i64) {
        let token = verify_token_of(pool, id).await;
        verify_admin(
            uow,
            svc,
            id,
            AdminVerify {
                verify_token: token,
                name: "Ops".into(),
                password: "correct horse".into(),
            },
        )
        .await
        .unwrap();
    }

    fn login_data(login_id: &str, password: &str) -> AdminLogin {
        AdminLogin {
            login_id: login_id.into(),
            password: password.into(),
        }
    }

    async fn stored_token(pool: &SqlitePool, id: i64) -> Option<String> {
        sqlx::query_scalar("SELECT token FROM admin WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_then_query_round_trip() {
        let pool = test_pool().await;
        let mut uow = uow(&pool);
        let created = create_admin(&mut uow, &manager_claims(99), create_data("ops@example.com"))
            .await
            .unwrap();

        let fetched = get_admin(&pool, created.id).await.unwrap();
        assert_eq!(fetched.login_id, "ops@example.com");

        let listed = get_admins(&pool, PageRequest::default()).await.unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.items.len(), 1);
    }

    #[tokio::test]
    async fn reinvite_supersedes_a_pending_invite() {
        let pool = test_pool().await;
        let mut uow = uow(&pool);
        let first = create_admin(&mut uow, &manager_claims(99), create_data("ops@example.com"))
            .await
            .unwrap();
        let second = create_admin(&mut uow, &manager_claims(99), create_data("ops@example.com"))
            .await
            .unwrap();
        assert_ne!(first.id, second.id);

        // The superseded invite is gone outright, not soft-deleted.
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin WHERE login_id = ?")
            .bind("ops@example.com")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn verified_login_id_cannot_be_reinvited() {
        let pool = test_pool().await;
        let mut uow = uow(&pool);
        let svc = tokens(1800, true);
        let created = create_admin(&mut uow, &manager_claims(99), create_data("ops@example.com"))
            .await
            .unwrap();
        join(&mut uow, &svc, &pool, created.id).await;

        let result =
            create_admin(&mut uow, &manager_claims(99), create_data("ops@example.com")).await;
        assert!(matches!(
            result,
            Err(ServiceError::BadRequest {
                code: Code::AlreadyJoinedAccount
            })
        ));
    }

    #[tokio::test]
    async fn verify_rejects_a_wrong_token() {
        let pool = test_pool().await;
        let mut uow = uow(&pool);
        let svc = tokens(1800, true);
        let created = create_admin(&mut uow, &manager_claims(99), create_data("ops@example.com"))
            .await
            .unwrap();

        let result = verify_admin(
            &mut uow,
            &svc,
            created.id,
            AdminVerify {
                verify_token: "not-the-token".into(),
                name: "Ops".into(),
                password: "correct horse".into(),
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(ServiceError::BadRequest {
                code: Code::InvalidVerifyToken
            })
        ));

        // Login stays blocked until the invite is actually claimed.
        let result = login(&mut uow, &svc, login_data("ops@example.com", "correct horse")).await;
        assert!(matches!(
            result,
            Err(ServiceError::BadRequest {
                code: Code::NotVerifiedAccount
            })
        ));
    }

    #[tokio::test]
    async fn verify_starts_a_session_and_claims_once() {
        let pool = test_pool().await;
        let mut uow = uow(&pool);
        let svc = tokens(1800, true);
        let created = create_admin(&mut uow, &manager_claims(99), create_data("ops@example.com"))
            .await
            .unwrap();
        let token = verify_token_of(&pool, created.id).await;

        let pair = verify_admin(
            &mut uow,
            &svc,
            created.id,
            AdminVerify {
                verify_token: token.clone(),
                name: "Claimed".into(),
                password: "correct horse".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(svc.decode_refresh(&pair.refresh_token).unwrap().id, created.id);
        assert_eq!(stored_token(&pool, created.id).await, Some(pair.refresh_token));

        let result = verify_admin(
            &mut uow,
            &svc,
            created.id,
            AdminVerify {
                verify_token: token,
                name: "Claimed".into(),
                password: "correct horse".into(),
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(ServiceError::BadRequest {
                code: Code::AlreadyJoinedAccount
            })
        ));
    }

    #[tokio::test]
    async fn non_manager_cannot_grant_the_manager_flag() {
        let pool = test_pool().await;
        let mut uow = uow(&pool);
        let created = create_admin(&mut uow, &manager_claims(99), create_data("ops@example.com"))
            .await
            .unwrap();

        let mut operator = manager_claims(50);
        operator.manager_flag = false;
        operator.authorities = BTreeSet::from([Authority::AdminEdit]);

        let mut escalation = AdminUpdate {
            login_id: "ops@example.com".into(),
            name: "Ops".into(),
            use_flag: true,
            manager_flag: true,
            authorities: BTreeSet::new(),
        };
        let result = update_admin(&mut uow, &operator, created.id, escalation).await;
        assert!(matches!(result, Err(ServiceError::Forbidden { .. })));

        escalation = AdminUpdate {
            login_id: "ops@example.com".into(),
            name: "Ops renamed".into(),
            use_flag: true,
            manager_flag: false,
            authorities: BTreeSet::from([Authority::AdminView]),
        };
        update_admin(&mut uow, &operator, created.id, escalation)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cannot_remove_yourself() {
        let pool = test_pool().await;
        let mut uow = uow(&pool);
        let created = create_admin(&mut uow, &manager_claims(99), create_data("ops@example.com"))
            .await
            .unwrap();
        let result = remove_admin(&mut uow, &manager_claims(created.id), created.id).await;
        assert!(matches!(
            result,
            Err(ServiceError::BadRequest {
                code: Code::CannotRemoveYourself
            })
        ));
    }

    #[tokio::test]
    async fn login_failures_are_bad_requests() {
        let pool = test_pool().await;
        let mut uow = uow(&pool);
        let svc = tokens(1800, true);
        let created = create_admin(&mut uow, &manager_claims(99), create_data("ops@example.com"))
            .await
            .unwrap();
        join(&mut uow, &svc, &pool, created.id).await;

        let result = login(&mut uow, &svc, login_data("nobody@example.com", "whatever")).await;
        assert!(matches!(
            result,
            Err(ServiceError::BadRequest {
                code: Code::UnjoinedAccount
            })
        ));

        let result = login(&mut uow, &svc, login_data("ops@example.com", "wrong")).await;
        assert!(matches!(
            result,
            Err(ServiceError::BadRequest {
                code: Code::InvalidPassword
            })
        ));

        remove_admin(&mut uow, &manager_claims(99), created.id)
            .await
            .unwrap();
        let result = login(&mut uow, &svc, login_data("ops@example.com", "correct horse")).await;
        assert!(matches!(
            result,
            Err(ServiceError::BadRequest {
                code: Code::UnjoinedAccount
            })
        ));
    }

    #[tokio::test]
    async fn login_stores_the_refresh_token() {
        let pool = test_pool().await;
        let mut uow = uow(&pool);
        let svc = tokens(1800, true);
        let created = create_admin(&mut uow, &manager_claims(99), create_data("ops@example.com"))
            .await
            .unwrap();
        join(&mut uow, &svc, &pool, created.id).await;

        let pair = login(&mut uow, &svc, login_data("ops@example.com", "correct horse"))
            .await
            .unwrap();
        assert_eq!(svc.decode_refresh(&pair.refresh_token).unwrap().id, created.id);
        assert_eq!(stored_token(&pool, created.id).await, Some(pair.refresh_token));
    }

    #[tokio::test]
    async fn renewal_rotates_the_stored_token() {
        let pool = test_pool().await;
        let mut uow = uow(&pool);
        // Test mode disables the grace window so rotation always applies.
        let svc = tokens(1800, true);
        let created = create_admin(&mut uow, &manager_claims(99), create_data("ops@example.com"))
            .await
            .unwrap();
        join(&mut uow, &svc, &pool, created.id).await;
        let pair = login(&mut uow, &svc, login_data("ops@example.com", "correct horse"))
            .await
            .unwrap();

        let renewed = renew_token(&mut uow, &svc, &pair.refresh_token).await.unwrap();
        assert_eq!(
            stored_token(&pool, created.id).await,
            Some(renewed.refresh_token)
        );
        assert!(svc.decode_access(&renewed.access_token).is_ok());
    }

    #[tokio::test]
    async fn renewal_with_mismatched_token_is_unauthorized() {
        let pool = test_pool().await;
        let mut uow = uow(&pool);
        let svc = tokens(1800, true);
        let created = create_admin(&mut uow, &manager_claims(99), create_data("ops@example.com"))
            .await
            .unwrap();
        join(&mut uow, &svc, &pool, created.id).await;
        let pair = login(&mut uow, &svc, login_data("ops@example.com", "correct horse"))
            .await
            .unwrap();

        // Replace the stored token with a different, still-valid one; the
        // presented token no longer matches and grace does not apply.
        let other = tokens(1740, true)
            .issue_refresh_token(&crate::auth::models::RefreshTokenClaims { id: created.id })
            .unwrap();
        sqlx::query("UPDATE admin SET token = ? WHERE id = ?")
            .bind(&other)
            .bind(created.id)
            .execute(&pool)
            .await
            .unwrap();

        let result = renew_token(&mut uow, &svc, &pair.refresh_token).await;
        assert!(matches!(result, Err(ServiceError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn renewal_inside_grace_window_keeps_the_stored_token() {
        let pool = test_pool().await;
        let mut uow = uow(&pool);
        // Grace enabled: the freshly stored token is inside the window, so
        // renewal returns it unchanged instead of rotating.
        let svc = tokens(1800, false);
        let created = create_admin(&mut uow, &manager_claims(99), create_data("ops@example.com"))
            .await
            .unwrap();
        join(&mut uow, &svc, &pool, created.id).await;
        let pair = login(&mut uow, &svc, login_data("ops@example.com", "correct horse"))
            .await
            .unwrap();

        let renewed = renew_token(&mut uow, &svc, &pair.refresh_token).await.unwrap();
        assert_eq!(renewed.refresh_token, pair.refresh_token);
    }

    #[tokio::test]
    async fn renewal_after_logout_is_unauthorized() {
        let pool = test_pool().await;
        let mut uow = uow(&pool);
        let svc = tokens(1800, true);
        let created = create_admin(&mut uow, &manager_claims(99), create_data("ops@example.com"))
            .await
            .unwrap();
        join(&mut uow, &svc, &pool, created.id).await;
        let pair = login(&mut uow, &svc, login_data("ops@example.com", "correct horse"))
            .await
            .unwrap();

        logout(&mut uow, &manager_claims(created.id)).await.unwrap();
        assert_eq!(stored_token(&pool, created.id).await, None);

        let result = renew_token(&mut uow, &svc, &pair.refresh_token).await;
        assert!(matches!(result, Err(ServiceError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn change_password_guards() {
        let pool = test_pool().await;
        let mut uow = uow(&pool);
        let svc = tokens(1800, true);
        let created = create_admin(&mut uow, &manager_claims(99), create_data("ops@example.com"))
            .await
            .unwrap();
        join(&mut uow, &svc, &pool, created.id).await;
        let me = manager_claims(created.id);

        let result = change_password(
            &mut uow,
            &me,
            AdminChangePassword {
                old_password: "wrong".into(),
                new_password: "a whole new phrase".into(),
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(ServiceError::BadRequest {
                code: Code::InvalidPassword
            })
        ));

        let result = change_password(
            &mut uow,
            &me,
            AdminChangePassword {
                old_password: "correct horse".into(),
                new_password: "correct horse".into(),
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(ServiceError::BadRequest {
                code: Code::ChangeToSamePassword
            })
        ));

        change_password(
            &mut uow,
            &me,
            AdminChangePassword {
                old_password: "correct horse".into(),
                new_password: "a whole new phrase".into(),
            },
        )
        .await
        .unwrap();
    }
}
