//! The User aggregate: end-user accounts managed by admins.
//!
//! Users carry the same credential and lifecycle state as admins but never
//! hold the manager flag.

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

#[derive(Debug, Deserialize, Validate)]
pub struct UserCreate {
    #[validate(length(min = 1, message = "Login id is required"))]
    pub login_id: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub use_flag: bool,
    #[serde(default)]
    pub authorities: BTreeSet<Authority>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserUpdate {
    #[validate(length(min = 1, message = "Login id is required"))]
    pub login_id: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub use_flag: bool,
    #[serde(default)]
    pub authorities: BTreeSet<Authority>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserLogin {
    #[validate(length(min = 1, message = "Login id is required"))]
    pub login_id: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserChangePassword {
    #[validate(length(min = 1, message = "Old password is required"))]
    pub old_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Snapshot of a user, returned by the API and carried in events.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub login_id: String,
    pub name: String,
    pub use_flag: bool,
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

#[derive(Debug)]
pub struct User {
    pub id: i64,
    pub login_id: String,
    pub password: Option<String>,
    pub token: Option<String>,
    pub name: String,
    pub use_flag: bool,
    pub authorities: BTreeSet<Authority>,
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

impl User {
    pub fn new(data: UserCreate, operator: Operator) -> ServiceResult<Self> {
        let now = Utc::now();
        Ok(User {
            id: 0,
            login_id: data.login_id,
            password: Some(hash_password(&data.password)?),
            token: None,
            name: data.name,
            use_flag: data.use_flag,
            authorities: data.authorities,
            change_password_at: Some(now),
            latest_active_at: None,
            joined_at: Some(now),
            removed_flag: false,
            removed_at: None,
            created_at: now,
            created_by_id: operator.id,
            created_by_type: operator.user_type,
            updated_at: now,
            updated_by_id: operator.id,
            updated_by_type: operator.user_type,
            events: VecDeque::new(),
        })
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
        authorities: BTreeSet<Authority>,
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
        User {
            id,
            login_id,
            password,
            token,
            name,
            use_flag,
            authorities,
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

    pub fn access_claims(&self) -> AccessTokenClaims {
        AccessTokenClaims {
            id: self.id,
            login_id: self.login_id.clone(),
            name: self.name.clone(),
            user_type: UserType::User,
            manager_flag: false,
            authorities: self.authorities.clone(),
        }
    }

    pub fn refresh_claims(&self) -> RefreshTokenClaims {
        RefreshTokenClaims { id: self.id }
    }

    pub fn update(&mut self, data: UserUpdate, operator: Operator) {
        let now = Utc::now();
        self.login_id = data.login_id;
        self.name = data.name;
        self.use_flag = data.use_flag;
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

    /// Clears the credential so the account must set a new password;
    /// the notification handler mails the reset notice.
    pub fn reset_password(&mut self, operator: Operator) {
        let now = Utc::now();
        self.password = None;
        self.token = None;
        self.change_password_at = Some(now);
        self.updated_at = now;
        self.updated_by_id = operator.id;
        self.updated_by_type = operator.user_type;
    }

    /// Soft delete; the row is never physically removed.
    pub fn remove(&mut self, operator: Operator) {
        let now = Utc::now();
        self.removed_flag = true;
        self.removed_at = Some(now);
        self.updated_at = now;
        self.updated_by_id = operator.id;
        self.updated_by_type = operator.user_type;
    }

    pub fn renew_token(&mut self, refresh_token: String) {
        self.token = Some(refresh_token);
        self.latest_active_at = Some(Utc::now());
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    fn record(&mut self, event: DomainEvent) {
        self.events.push_back(event);
    }

    pub fn on_created(&mut self) -> UserResponse {
        let snapshot = UserResponse::from(&*self);
        self.record(DomainEvent::UserCreated(snapshot.clone()));
        snapshot
    }

    pub fn on_updated(&mut self) -> UserResponse {
        let snapshot = UserResponse::from(&*self);
        self.record(DomainEvent::UserUpdated(snapshot.clone()));
        snapshot
    }

    pub fn on_password_reset(&mut self) -> UserResponse {
        let snapshot = UserResponse::from(&*self);
        self.record(DomainEvent::UserPasswordReset(snapshot.clone()));
        snapshot
    }

    pub fn on_logged_in(&mut self) -> UserResponse {
        let snapshot = UserResponse::from(&*self);
        self.record(DomainEvent::UserLoggedIn(snapshot.clone()));
        snapshot
    }

    pub fn on_removed(&mut self) -> UserResponse {
        let snapshot = UserResponse::from(&*self);
        self.record(DomainEvent::UserRemoved(snapshot.clone()));
        snapshot
    }
}

impl Aggregate for User {
    fn id(&self) -> i64 {
        self.id
    }

    fn take_event(&mut self) -> Option<DomainEvent> {
        self.events.pop_front()
    }
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id,
            login_id: user.login_id.clone(),
            name: user.name.clone(),
            use_flag: user.use_flag,
            authorities: user.authorities.clone(),
            joined_at: user.joined_at,
            latest_active_at: user.latest_active_at,
            change_password_at: user.change_password_at,
            removed_flag: user.removed_flag,
            created_at: user.created_at,
            updated_at: user.updated_at,
            updated_by_id: user.updated_by_id,
            updated_by_type: user.updated_by_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::EventKind;

    fn operator() -> Operator {
        Operator {
            id: 1,
            user_type: UserType::Admin,
        }
    }

    fn create_data() -> UserCreate {
        UserCreate {
            login_id: "user@example.com".into(),
            password: "correct horse".into(),
            name: "User".into(),
            use_flag: true,
            authorities: BTreeSet::new(),
        }
    }

    #[test]
    fn reset_password_clears_credential_and_session() {
        let mut user = User::new(create_data(), operator()).unwrap();
        user.renew_token("refresh".into());
        user.reset_password(operator());
        user.on_password_reset();

        assert!(user.password.is_none());
        assert!(user.token.is_none());
        assert_eq!(
            user.take_event().unwrap().kind(),
            EventKind::UserPasswordReset
        );
    }

    #[test]
    fn user_claims_never_carry_manager_flag() {
        let user = User::new(create_data(), operator()).unwrap();
        let claims = user.access_claims();
        assert!(!claims.manager_flag);
        assert_eq!(claims.user_type, UserType::User);
    }
}
