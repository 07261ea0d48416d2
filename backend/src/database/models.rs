//! Shared persisted types used across repositories and domain aggregates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discriminator for the two principal kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    Admin,
    User,
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserType::Admin => write!(f, "ADMIN"),
            UserType::User => write!(f, "USER"),
        }
    }
}

/// Fine-grained permission tag carried in access-token claims and stored on
/// principals as a JSON array.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Authority {
    AdminView,
    AdminEdit,
    UserView,
    UserEdit,
    NoticeView,
    NoticeEdit,
}

impl Authority {
    /// Every defined authority; granted implicitly to managers.
    pub const ALL: [Authority; 6] = [
        Authority::AdminView,
        Authority::AdminEdit,
        Authority::UserView,
        Authority::UserEdit,
        Authority::NoticeView,
        Authority::NoticeEdit,
    ];
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Authority::AdminView => "ADMIN_VIEW",
            Authority::AdminEdit => "ADMIN_EDIT",
            Authority::UserView => "USER_VIEW",
            Authority::UserEdit => "USER_EDIT",
            Authority::NoticeView => "NOTICE_VIEW",
            Authority::NoticeEdit => "NOTICE_EDIT",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Authority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN_VIEW" => Ok(Authority::AdminView),
            "ADMIN_EDIT" => Ok(Authority::AdminEdit),
            "USER_VIEW" => Ok(Authority::UserView),
            "USER_EDIT" => Ok(Authority::UserEdit),
            "NOTICE_VIEW" => Ok(Authority::NoticeView),
            "NOTICE_EDIT" => Ok(Authority::NoticeEdit),
            other => Err(format!("unknown authority: {other}")),
        }
    }
}
