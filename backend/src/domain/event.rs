//! Domain events dispatched at unit-of-work commit time.

use crate::domain::admin::AdminResponse;
use crate::domain::notice::NoticeResponse;
use crate::domain::user::UserResponse;
use std::fmt;

/// A domain event with its snapshot payload, queued on an aggregate's outbox.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    AdminCreated(AdminResponse),
    AdminJoined(AdminResponse),
    AdminUpdated(AdminResponse),
    AdminPasswordChanged(AdminResponse),
    AdminLoggedIn(AdminResponse),
    AdminRemoved(AdminResponse),
    UserCreated(UserResponse),
    UserUpdated(UserResponse),
    UserPasswordReset(UserResponse),
    UserLoggedIn(UserResponse),
    UserRemoved(UserResponse),
    NoticeCreated(NoticeResponse),
    NoticeUpdated(NoticeResponse),
    NoticeRemoved(NoticeResponse),
}

/// Payload-free discriminant used as the handler-registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AdminCreated,
    AdminJoined,
    AdminUpdated,
    AdminPasswordChanged,
    AdminLoggedIn,
    AdminRemoved,
    UserCreated,
    UserUpdated,
    UserPasswordReset,
    UserLoggedIn,
    UserRemoved,
    NoticeCreated,
    NoticeUpdated,
    NoticeRemoved,
}

impl EventKind {
    /// Every defined event kind, for handlers that subscribe to everything.
    pub const ALL: [EventKind; 14] = [
        EventKind::AdminCreated,
        EventKind::AdminJoined,
        EventKind::AdminUpdated,
        EventKind::AdminPasswordChanged,
        EventKind::AdminLoggedIn,
        EventKind::AdminRemoved,
        EventKind::UserCreated,
        EventKind::UserUpdated,
        EventKind::UserPasswordReset,
        EventKind::UserLoggedIn,
        EventKind::UserRemoved,
        EventKind::NoticeCreated,
        EventKind::NoticeUpdated,
        EventKind::NoticeRemoved,
    ];
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::AdminCreated(_) => EventKind::AdminCreated,
            DomainEvent::AdminJoined(_) => EventKind::AdminJoined,
            DomainEvent::AdminUpdated(_) => EventKind::AdminUpdated,
            DomainEvent::AdminPasswordChanged(_) => EventKind::AdminPasswordChanged,
            DomainEvent::AdminLoggedIn(_) => EventKind::AdminLoggedIn,
            DomainEvent::AdminRemoved(_) => EventKind::AdminRemoved,
            DomainEvent::UserCreated(_) => EventKind::UserCreated,
            DomainEvent::UserUpdated(_) => EventKind::UserUpdated,
            DomainEvent::UserPasswordReset(_) => EventKind::UserPasswordReset,
            DomainEvent::UserLoggedIn(_) => EventKind::UserLoggedIn,
            DomainEvent::UserRemoved(_) => EventKind::UserRemoved,
            DomainEvent::NoticeCreated(_) => EventKind::NoticeCreated,
            DomainEvent::NoticeUpdated(_) => EventKind::NoticeUpdated,
            DomainEvent::NoticeRemoved(_) => EventKind::NoticeRemoved,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
