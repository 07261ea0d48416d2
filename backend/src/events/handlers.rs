//! Built-in side-effect handlers: audit history and email notification.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::event::DomainEvent;
use crate::errors::{ServiceError, ServiceResult};
use crate::events::dispatcher::{EventContext, EventHandler};
use crate::repositories::audit_repository::{self, AuditEntry};
use crate::services::email_service::EmailService;

/// Appends one audit row per event, inside the same transaction as the write
/// that produced it.
pub struct AuditLogHandler;

macro_rules! snapshot_entry {
    ($entity:literal, $action:literal, $data:expr) => {
        (
            $entity,
            $data.id,
            $action,
            $data.updated_by_id,
            $data.updated_by_type,
            serde_json::to_value($data),
        )
    };
}

fn audit_entry(event: &DomainEvent) -> ServiceResult<AuditEntry> {
    let (entity, entity_id, action, actor_id, actor_type, detail) = match event {
        DomainEvent::AdminCreated(data) => snapshot_entry!("admin", "CREATE", data),
        DomainEvent::AdminJoined(data) => snapshot_entry!("admin", "JOIN", data),
        DomainEvent::AdminUpdated(data) => snapshot_entry!("admin", "UPDATE", data),
        DomainEvent::AdminPasswordChanged(data) => {
            snapshot_entry!("admin", "PASSWORD_CHANGE", data)
        }
        DomainEvent::AdminLoggedIn(data) => snapshot_entry!("admin", "LOGIN", data),
        DomainEvent::AdminRemoved(data) => snapshot_entry!("admin", "REMOVE", data),
        DomainEvent::UserCreated(data) => snapshot_entry!("user", "CREATE", data),
        DomainEvent::UserUpdated(data) => snapshot_entry!("user", "UPDATE", data),
        DomainEvent::UserPasswordReset(data) => snapshot_entry!("user", "PASSWORD_RESET", data),
        DomainEvent::UserLoggedIn(data) => snapshot_entry!("user", "LOGIN", data),
        DomainEvent::UserRemoved(data) => snapshot_entry!("user", "REMOVE", data),
        DomainEvent::NoticeCreated(data) => snapshot_entry!("notice", "CREATE", data),
        DomainEvent::NoticeUpdated(data) => snapshot_entry!("notice", "UPDATE", data),
        DomainEvent::NoticeRemoved(data) => snapshot_entry!("notice", "REMOVE", data),
    };

    Ok(AuditEntry {
        actor_id,
        actor_type,
        entity: entity.to_string(),
        entity_id,
        action: action.to_string(),
        detail: detail
            .map_err(|e| ServiceError::system_fault(format!("audit serialization failed: {e}")))?,
    })
}

#[async_trait]
impl EventHandler for AuditLogHandler {
    async fn handle(&self, ctx: &mut EventContext<'_>) -> ServiceResult<()> {
        let entry = audit_entry(ctx.event)?;
        audit_repository::append(&mut *ctx.session, &entry).await
    }
}

/// Mails account holders about noteworthy lifecycle changes; ignores the
/// transactional session entirely.
pub struct EmailNotificationHandler {
    email: Arc<EmailService>,
}

impl EmailNotificationHandler {
    pub fn new(email: Arc<EmailService>) -> Self {
        EmailNotificationHandler { email }
    }
}

#[async_trait]
impl EventHandler for EmailNotificationHandler {
    async fn handle(&self, ctx: &mut EventContext<'_>) -> ServiceResult<()> {
        match ctx.event {
            DomainEvent::AdminCreated(data) => {
                self.email
                    .send(
                        &data.login_id,
                        "You have been invited as an administrator",
                        &format!(
                            "<p>An admin account has been created for you. \
                             Verify the invitation to claim it.</p>\
                             <p>Login id: {}</p>",
                            data.login_id
                        ),
                    )
                    .await
            }
            DomainEvent::UserPasswordReset(data) => {
                self.email
                    .send(
                        &data.login_id,
                        "Your password has been reset",
                        &format!(
                            "<p>Your password has been reset by an administrator.</p>\
                             <p>Login id: {}</p>",
                            data.login_id
                        ),
                    )
                    .await
            }
            _ => Ok(()),
        }
    }
}
