//! Global application error types and handlers.
//!
//! This module defines custom error types that are used across the entire
//! backend application and provides mechanisms for consistent error handling
//! and response formatting.

use serde::Serialize;
use thiserror::Error;

/// Symbolic error codes shared between the service layer and API responses.
///
/// The symbolic name is returned in the failure envelope's `code` field; the
/// message is the human-readable counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Code {
    UnknownSystemError,
    UnknownAuthentication,
    UnknownAuthority,
    UnknownAdmin,
    UnknownUser,
    UnknownNotice,
    InvalidAccess,
    InvalidPassword,
    InvalidParameter,
    InvalidVerifyToken,
    NotVerifiedAccount,
    CannotUpdateYourself,
    CannotRemoveYourself,
    AlreadyJoinedAccount,
    UnjoinedAccount,
    ChangeToSamePassword,
    ExpiredToken,
}

impl Code {
    /// Machine-readable symbolic name used in the response envelope.
    pub fn name(&self) -> &'static str {
        match self {
            Code::UnknownSystemError => "UNKNOWN_SYSTEM_ERROR",
            Code::UnknownAuthentication => "UNKNOWN_AUTHENTICATION",
            Code::UnknownAuthority => "UNKNOWN_AUTHORITY",
            Code::UnknownAdmin => "UNKNOWN_ADMIN",
            Code::UnknownUser => "UNKNOWN_USER",
            Code::UnknownNotice => "UNKNOWN_NOTICE",
            Code::InvalidAccess => "INVALID_ACCESS",
            Code::InvalidPassword => "INVALID_PASSWORD",
            Code::InvalidParameter => "INVALID_PARAMETER",
            Code::InvalidVerifyToken => "INVALID_VERIFY_TOKEN",
            Code::NotVerifiedAccount => "NOT_VERIFIED_ACCOUNT",
            Code::CannotUpdateYourself => "CANNOT_UPDATE_YOURSELF",
            Code::CannotRemoveYourself => "CANNOT_REMOVE_YOURSELF",
            Code::AlreadyJoinedAccount => "ALREADY_JOINED_ACCOUNT",
            Code::UnjoinedAccount => "UNJOINED_ACCOUNT",
            Code::ChangeToSamePassword => "CHANGE_TO_SAME_PASSWORD",
            Code::ExpiredToken => "EXPIRED_TOKEN",
        }
    }

    /// Human-readable message for the response envelope.
    pub fn message(&self) -> &'static str {
        match self {
            Code::UnknownSystemError => "Unknown system error",
            Code::UnknownAuthentication => "Unknown authentication",
            Code::UnknownAuthority => "Unknown authority",
            Code::UnknownAdmin => "Unknown admin",
            Code::UnknownUser => "Unknown user",
            Code::UnknownNotice => "Unknown notice",
            Code::InvalidAccess => "Invalid access",
            Code::InvalidPassword => "Invalid password",
            Code::InvalidParameter => "Invalid request parameter",
            Code::InvalidVerifyToken => "Invalid verification token",
            Code::NotVerifiedAccount => "Account not verified",
            Code::CannotUpdateYourself => "Cannot update your own account",
            Code::CannotRemoveYourself => "Cannot remove your own account",
            Code::AlreadyJoinedAccount => "Account already joined",
            Code::UnjoinedAccount => "Account not joined",
            Code::ChangeToSamePassword => "Cannot change to the same password",
            Code::ExpiredToken => "Expired token",
        }
    }
}

/// Generic service error that can be used across all entities.
///
/// Business and authorization faults propagate unchanged through the unit of
/// work up to the API boundary, which maps them onto the response envelope.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Violated business precondition; recoverable by changing the input.
    #[error("bad request: {code:?}")]
    BadRequest { code: Code },

    /// Missing, invalid or expired credential.
    #[error("unauthorized: {code:?}")]
    Unauthorized { code: Code },

    /// Valid credential with insufficient authority.
    #[error("forbidden: {code:?}")]
    Forbidden { code: Code },

    /// Internal invariant violation; always a bug.
    #[error("system fault: {message}")]
    SystemFault { message: String },

    /// Re-entrant transaction start; a programming error, not a business error.
    #[error("unit of work already in use")]
    DuplicateUnitOfWork,

    #[error("database error: {source}")]
    Database {
        #[from]
        source: sqlx::Error,
    },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    // Helper constructors for common patterns

    pub fn bad_request(code: Code) -> Self {
        Self::BadRequest { code }
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized {
            code: Code::UnknownAuthentication,
        }
    }

    pub fn expired_token() -> Self {
        Self::Unauthorized {
            code: Code::ExpiredToken,
        }
    }

    pub fn forbidden() -> Self {
        Self::Forbidden {
            code: Code::UnknownAuthority,
        }
    }

    pub fn system_fault(message: impl Into<String>) -> Self {
        Self::SystemFault {
            message: message.into(),
        }
    }

    /// The symbolic code surfaced to the caller.
    pub fn code(&self) -> Code {
        match self {
            Self::BadRequest { code } | Self::Unauthorized { code } | Self::Forbidden { code } => {
                *code
            }
            Self::SystemFault { .. } | Self::DuplicateUnitOfWork | Self::Database { .. } => {
                Code::UnknownSystemError
            }
        }
    }
}
