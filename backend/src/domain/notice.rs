//! The Notice aggregate: announcements published to end users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use validator::Validate;

use crate::database::models::UserType;
use crate::domain::event::DomainEvent;
use crate::domain::{Aggregate, Operator};

#[derive(Debug, Deserialize, Validate)]
pub struct NoticeCreate {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Body is required"))]
    pub body: String,
    pub use_flag: bool,
}

/// Snapshot of a notice, returned by the API and carried in events.
#[derive(Debug, Clone, Serialize)]
pub struct NoticeResponse {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub use_flag: bool,
    pub removed_flag: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by_id: i64,
    pub updated_by_type: UserType,
}

#[derive(Debug)]
pub struct Notice {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub use_flag: bool,
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

impl Notice {
    pub fn new(data: NoticeCreate, operator_id: i64) -> Self {
        let now = Utc::now();
        Notice {
            id: 0,
            title: data.title,
            body: data.body,
            use_flag: data.use_flag,
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
        title: String,
        body: String,
        use_flag: bool,
        removed_flag: bool,
        removed_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        created_by_id: i64,
        created_by_type: UserType,
        updated_at: DateTime<Utc>,
        updated_by_id: i64,
        updated_by_type: UserType,
    ) -> Self {
        Notice {
            id,
            title,
            body,
            use_flag,
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

    pub fn update(&mut self, data: NoticeCreate, operator: Operator) {
        let now = Utc::now();
        self.title = data.title;
        self.body = data.body;
        self.use_flag = data.use_flag;
        self.updated_at = now;
        self.updated_by_id = operator.id;
        self.updated_by_type = operator.user_type;
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

    fn record(&mut self, event: DomainEvent) {
        self.events.push_back(event);
    }

    pub fn on_created(&mut self) -> NoticeResponse {
        let snapshot = NoticeResponse::from(&*self);
        self.record(DomainEvent::NoticeCreated(snapshot.clone()));
        snapshot
    }

    pub fn on_updated(&mut self) -> NoticeResponse {
        let snapshot = NoticeResponse::from(&*self);
        self.record(DomainEvent::NoticeUpdated(snapshot.clone()));
        snapshot
    }

    pub fn on_removed(&mut self) -> NoticeResponse {
        let snapshot = NoticeResponse::from(&*self);
        self.record(DomainEvent::NoticeRemoved(snapshot.clone()));
        snapshot
    }
}

impl Aggregate for Notice {
    fn id(&self) -> i64 {
        self.id
    }

    fn take_event(&mut self) -> Option<DomainEvent> {
        self.events.pop_front()
    }
}

impl From<&Notice> for NoticeResponse {
    fn from(notice: &Notice) -> Self {
        NoticeResponse {
            id: notice.id,
            title: notice.title.clone(),
            body: notice.body.clone(),
            use_flag: notice.use_flag,
            removed_flag: notice.removed_flag,
            created_at: notice.created_at,
            updated_at: notice.updated_at,
            updated_by_id: notice.updated_by_id,
            updated_by_type: notice.updated_by_type,
        }
    }
}
