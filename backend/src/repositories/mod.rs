//! SQLite persistence for aggregates and the audit trail.
//!
//! Each repository implements [`crate::uow::Repository`] for its aggregate
//! and adds read-side queries used by the query handlers against the
//! readonly pool. Authority sets are stored as JSON arrays in a TEXT column.

pub mod admin_repository;
pub mod audit_repository;
pub mod notice_repository;
pub mod user_repository;

use std::collections::BTreeSet;

use crate::database::models::Authority;
use crate::errors::{ServiceError, ServiceResult};

pub(crate) fn encode_authorities(authorities: &BTreeSet<Authority>) -> ServiceResult<String> {
    serde_json::to_string(authorities)
        .map_err(|e| ServiceError::system_fault(format!("authority encoding failed: {e}")))
}

pub(crate) fn decode_authorities(text: &str) -> ServiceResult<BTreeSet<Authority>> {
    serde_json::from_str(text)
        .map_err(|e| ServiceError::system_fault(format!("authority decoding failed: {e}")))
}
