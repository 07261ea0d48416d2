//! Append-only audit trail written by the audit event handler.

use chrono::Utc;
use sqlx::SqliteConnection;

use crate::database::models::UserType;
use crate::errors::{ServiceError, ServiceResult};

/// One row of change history, with the event payload as JSON detail.
#[derive(Debug)]
pub struct AuditEntry {
    pub actor_id: i64,
    pub actor_type: UserType,
    pub entity: String,
    pub entity_id: i64,
    pub action: String,
    pub detail: serde_json::Value,
}

pub async fn append(conn: &mut SqliteConnection, entry: &AuditEntry) -> ServiceResult<()> {
    let detail = serde_json::to_string(&entry.detail)
        .map_err(|e| ServiceError::system_fault(format!("audit detail encoding failed: {e}")))?;
    sqlx::query(
        "INSERT INTO audit_log (actor_id, actor_type, entity, entity_id, action, detail, \
         created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(entry.actor_id)
    .bind(entry.actor_type)
    .bind(&entry.entity)
    .bind(entry.entity_id)
    .bind(&entry.action)
    .bind(detail)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(())
}
