//! The Admin aggregate: back-office operators with authority sets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use validator::Validate;

use crate::auth::models::{AccessTokenClaims, RefreshTokenClaims};
use crate::database::models::{Authority, UserType};
use crate::domain::event::DomainEvent;
use crate::domain::{Aggregate, Operator};
use crate::errors::ServiceResult;
use crate::utils::password::hash_password;
use uuid::Uuid;

/// Admin invitation payload. The invitee sets their own credential when they
/// verify the invite.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminCreate {
    #[validate(length(min = 1, message = "Login id is required"))]
    pub login_id: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub use_flag: bool,
    pub manager_flag: bool,
    #[serde(default)]
    pub authorities: BTreeSet<Authority>,
}

/// Invite verification payload.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminVerify {
    #[validate(length(min = 1, message = "Verification token is required"))]
    pub verify_token: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Admin update payload.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminUpdate {
    #[validate(length(min = 1, message = "Login id is required"))]
    pub login_id: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub use_flag: bool,
    pub manager_flag: bool,
    #[serde(default)]
    pub authorities: BTreeSet<Authority>,
}

/// Login payload.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminLogin {
    #[validate(length(min = 1, message = "Login id is required"))]
    pub login_id: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Password change payload.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminChangePassword {
    #[validate(length(min = 1, message = "Old password is required"))]
    pub old_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Snapshot of an admin, returned by the API and carried in events.
#[derive(Debug, Clone, Serialize)]
pub struct AdminResponse {
    pub id: i64,
    pub login_id: String,
    pub name: String,
    pub use_flag: bool,
    pub manager_flag: bool,
    pub authorities: BTreeSet<Authority>,
    pub joined_at: Option<DateTime<Utc>>,
    pub latest_active_at: Option<DateTime<Utc>>,
    pub change_password_at: Option<DateTime<Utc>>,
    pub removed_flag: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by_id: i64,
    pub updated_by_type: UserType,
}

/// Back-office principal aggregate.
#[derive(Debug)]
pub struct Admin {
    pub id: i64,
    pub login_id: String,
    pub password: Option<String>,
    pub token: Option<String>,
    pub name: String,
    pub use_flag: bool,
    pub manager_flag: bool,
    pub authorities: BTreeSet<Authority>,
    pub verify_flag: bool,
    pub verify_token: Option<String>,
    pub change_password_at: Option<DateTime<Utc>>,
    pub latest_active_at: Option<DateTime<Utc>>,
    pub joined_at: Option<DateTime<Utc>>,
    pub removed_flag: bool,
    pub removed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by_id: i64,
    pub created_by_type: UserType,
    pub updated_at: DateTime<Utc>,
    pub updated_by_id: i64,
    pub updated_by_type: UserType,
    events: VecDeque<DomainEvent>,
}

impl Admin {
    /// A fresh invite: no credential yet, a one-time verification token.
    pub fn new(data: AdminCreate, operator_id: i64) -> Self {
        let now = Utc::now();
        Admin {
            id: 0,
            login_id: data.login_id,
            password: None,
            token: None,
            name: data.name,
            use_flag: data.use_flag,
            manager_flag: data.manager_flag,
            authorities: data.authorities,
            verify_flag: false,
            verify_token: Some(Uuid::new_v4().simple().to_string()),
            change_password_at: None,
            latest_active_at: None,
            joined_at: None,
            removed_flag: false,
            removed_at: None,
            created_at: now,
            created_by_id: operator_id,
            created_by_type: UserType::Admin,
            updated_at: now,
            updated_by_id: operator_id,
            updated_by_type: UserType::Admin,
            events: VecDeque::new(),
        }
    }

    /// Rebuilds an aggregate from persisted state, with an empty outbox.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: i64,
        login_id: String,
        password: Option<String>,
        token: Option<String>,
        name: String,
        use_flag: bool,
        manager_flag: bool,
        authorities: BTreeSet<Authority>,
        verify_flag: bool,
        verify_token: Option<String>,
        change_password_at: Option<DateTime<Utc>>,
        latest_active_at: Option<DateTime<Utc>>,
        joined_at: Option<DateTime<Utc>>,
        removed_flag: bool,
        removed_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        created_by_id: i64,
        created_by_type: UserType,
        updated_at: DateTime<Utc>,
        updated_by_id: i64,
        updated_by_type: UserType,
    ) -> Self {
        Admin {
            id,
            login_id,
            password,
            token,
            name,
            use_flag,
            manager_flag,
            authorities,
            verify_flag,
            verify_token,
            change_password_at,
            latest_active_at,
            joined_at,
            removed_flag,
            removed_at,
            created_at,
            created_by_id,
            created_by_type,
            updated_at,
            updated_by_id,
            updated_by_type,
            events: VecDeque::new(),
        }
    }

    /// Effective authority set; the manager flag escalates to every authority.
    pub fn effective_authorities(&self) -> BTreeSet<Authority> {
        if self.manager_flag {
            Authority::ALL.into_iter().collect()
        } else {
            self.authorities.clone()
        }
    }

    pub fn access_claims(&self) -> AccessTokenClaims {
        AccessTokenClaims {
            id: self.id,
            login_id: self.login_id.clone(),
            name: self.name.clone(),
            user_type: UserType::Admin,
            manager_flag: self.manager_flag,
            authorities: self.effective_authorities(),
        }
    }

    pub fn refresh_claims(&self) -> RefreshTokenClaims {
        RefreshTokenClaims { id: self.id }
    }

    /// Completes the invite: the invitee claims the account with their own
    /// name and password. The caller has already matched the verify token.
    pub fn verify(&mut self, data: &AdminVerify) -> ServiceResult<()> {
        let now = Utc::now();
        self.name = data.name.clone();
        self.password = Some(hash_password(&data.password)?);
        self.verify_flag = true;
        self.joined_at = Some(now);
        self.change_password_at = Some(now);
        self.updated_at = now;
        self.updated_by_id = self.id;
        self.updated_by_type = UserType::Admin;
        Ok(())
    }

    pub fn update(&mut self, data: AdminUpdate, operator: Operator) {
        let now = Utc::now();
        self.login_id = data.login_id;
        self.name = data.name;
        self.use_flag = data.use_flag;
        self.manager_flag = data.manager_flag;
        self.authorities = data.authorities;
        self.updated_at = now;
        self.updated_by_id = operator.id;
        self.updated_by_type = operator.user_type;
    }

    pub fn change_password(&mut self, new_password: &str, operator: Operator) -> ServiceResult<()> {
        let now = Utc::now();
        self.password = Some(hash_password(new_password)?);
        self.change_password_at = Some(now);
        self.updated_at = now;
        self.updated_by_id = operator.id;
        self.updated_by_type = operator.user_type;
        Ok(())
    }

    /// Soft delete; the row is never physically removed.
    pub fn remove(&mut self, operator_id: i64) {
        let now = Utc::now();
        self.removed_flag = true;
        self.removed_at = Some(now);
        self.updated_at = now;
        self.updated_by_id = operator_id;
        self.updated_by_type = UserType::Admin;
    }

    /// Stores a freshly minted refresh token as the single live session token.
    pub fn renew_token(&mut self, refresh_token: String) {
        self.token = Some(refresh_token);
        self.latest_active_at = Some(Utc::now());
    }

    /// Clears the stored token; a null token means logged out.
    pub fn logout(&mut self) {
        self.token = None;
    }

    fn record(&mut self, event: DomainEvent) {
        self.events.push_back(event);
    }

    pub fn on_created(&mut self) -> AdminResponse {
        let snapshot = AdminResponse::from(&*self);
        self.record(DomainEvent::AdminCreated(snapshot.clone()));
        snapshot
    }

    pub fn on_joined(&mut self) -> AdminResponse {
        let snapshot = AdminResponse::from(&*self);
        self.record(DomainEvent::AdminJoined(snapshot.clone()));
        snapshot
    }

    pub fn on_updated(&mut self) -> AdminResponse {
        let snapshot = AdminResponse::from(&*self);
        self.record(DomainEvent::AdminUpdated(snapshot.clone()));
        snapshot
    }

    pub fn on_password_changed(&mut self) -> AdminResponse {
        let snapshot = AdminResponse::from(&*self);
        self.record(DomainEvent::AdminPasswordChanged(snapshot.clone()));
        snapshot
    }

    pub fn on_logged_in(&mut self) -> AdminResponse {
        let snapshot = AdminResponse::from(&*self);
        self.record(DomainEvent::AdminLoggedIn(snapshot.clone()));
        snapshot
    }

    pub fn on_removed(&mut self) -> AdminResponse {
        let snapshot = AdminResponse::from(&*self);
        self.record(DomainEvent::AdminRemoved(snapshot.clone()));
        snapshot
    }
}

impl Aggregate for Admin {
    fn id(&self) -> i64 {
        self.id
    }

    fn take_event(&mut self) -> Option<DomainEvent> {
        self.events.pop_front()
    }
}

impl From<&Admin> for AdminResponse {
    fn from(admin: &Admin) -> Self {
        AdminResponse {
            id: admin.id,
            login_id: admin.login_id.clone(),
            name: admin.name.clone(),
            use_flag: admin.use_flag,
            manager_flag: admin.manager_flag,
            authorities: admin.effective_authorities(),
            joined_at: admin.joined_at,
            latest_active_at: admin.latest_active_at,
            change_password_at: admin.change_password_at,
            removed_flag: admin.removed_flag,
            created_at: admin.created_at,
            updated_at: admin.updated_at,
            updated_by_id: admin.updated_by_id,
            updated_by_type: admin.updated_by_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::EventKind;

    fn create_data() -> AdminCreate {
        AdminCreate {
            login_id: "ops@example.com".into(),
            name: "Ops".into(),
            use_flag: true,
            manager_flag: false,
            authorities: BTreeSet::from([Authority::NoticeView]),
        }
    }

    #[test]
    fn outbox_drains_in_fifo_order() {
        let mut admin = Admin::new(create_data(), 1);
        admin.on_created();
        admin.on_updated();

        assert_eq!(admin.take_event().unwrap().kind(), EventKind::AdminCreated);
        assert_eq!(admin.take_event().unwrap().kind(), EventKind::AdminUpdated);
        assert!(admin.take_event().is_none());
    }

    #[test]
    fn manager_flag_escalates_authorities() {
        let mut data = create_data();
        data.manager_flag = true;
        let admin = Admin::new(data, 1);
        assert_eq!(
            admin.effective_authorities(),
            Authority::ALL.into_iter().collect()
        );
        assert!(admin.access_claims().manager_flag);
    }

    #[test]
    fn fresh_invite_has_a_token_but_no_credential() {
        let admin = Admin::new(create_data(), 1);
        assert!(!admin.verify_flag);
        assert!(admin.verify_token.is_some());
        assert!(admin.password.is_none());
        assert!(admin.joined_at.is_none());
    }

    #[test]
    fn verify_claims_the_account() {
        let mut admin = Admin::new(create_data(), 1);
        admin
            .verify(&AdminVerify {
                verify_token: admin.verify_token.clone().unwrap(),
                name: "Claimed".into(),
                password: "correct horse".into(),
            })
            .unwrap();
        assert!(admin.verify_flag);
        assert!(admin.password.is_some());
        assert!(admin.joined_at.is_some());
        assert_eq!(admin.name, "Claimed");
    }

    #[test]
    fn logout_clears_stored_token() {
        let mut admin = Admin::new(create_data(), 1);
        admin.renew_token("refresh".into());
        assert!(admin.token.is_some());
        admin.logout();
        assert!(admin.token.is_none());
    }
}
