//! Domain aggregates and their event outboxes.
//!
//! Aggregates mutate their own state and append domain events to an explicit
//! FIFO outbox. The unit of work drains the outbox of every aggregate it has
//! seen before the storage commit.

pub mod admin;
pub mod event;
pub mod notice;
pub mod user;

use crate::database::models::UserType;
use crate::domain::event::DomainEvent;

/// The authenticated actor performing a command.
#[derive(Debug, Clone, Copy)]
pub struct Operator {
    pub id: i64,
    pub user_type: UserType,
}

impl From<&crate::auth::models::AccessTokenClaims> for Operator {
    fn from(claims: &crate::auth::models::AccessTokenClaims) -> Self {
        Operator {
            id: claims.id,
            user_type: claims.user_type,
        }
    }
}

/// Outbox contract every aggregate fulfills.
///
/// Events come back in enqueue order and each event is yielded exactly once;
/// after a full drain the queue is empty, never partially consumed.
pub trait Aggregate: Send + 'static {
    fn id(&self) -> i64;

    /// Pops the oldest pending event, if any.
    fn take_event(&mut self) -> Option<DomainEvent>;
}
