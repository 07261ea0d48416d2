//! Shared API plumbing: the failure envelope and the application context.

use axum::Json;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::token::TokenService;
use crate::database::Database;
use crate::errors::{Code, ServiceError};
use crate::events::EventHandlerRegistry;
use crate::services::admin_service::AdminUow;
use crate::services::notice_service::NoticeUow;
use crate::services::user_service::UserUow;

/// Response header hinting the client to renew its access token.
pub const RENEW_HEADER: &str = "token";
pub const RENEW_HEADER_VALUE: &str = "must-renew";

/// Failure envelope returned for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: &'static str,
    pub data: Option<serde_json::Value>,
}

/// Renders a service error as an HTTP response.
///
/// Expired-token failures additionally carry the `token: must-renew` header
/// so clients can distinguish "renew and retry" from "re-login".
pub fn error_response(error: ServiceError) -> Response {
    let status = match &error {
        ServiceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        ServiceError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        ServiceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        ServiceError::SystemFault { .. }
        | ServiceError::DuplicateUnitOfWork
        | ServiceError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(%error, "request failed with internal error");
    }

    let code = error.code();
    let body = ErrorBody {
        code: code.name(),
        message: code.message(),
        data: None,
    };

    let mut response = (status, Json(body)).into_response();
    if code == Code::ExpiredToken {
        response
            .headers_mut()
            .insert(RENEW_HEADER, HeaderValue::from_static(RENEW_HEADER_VALUE));
    }
    response
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        error_response(self)
    }
}

/// Per-process context handed to handlers through request extensions.
#[derive(Clone)]
pub struct AppContext {
    pub database: Database,
    pub tokens: Arc<TokenService>,
    pub registry: Arc<EventHandlerRegistry>,
}

impl AppContext {
    pub fn admin_uow(&self) -> AdminUow {
        AdminUow::new(self.database.pool().clone(), self.registry.clone())
    }

    pub fn user_uow(&self) -> UserUow {
        UserUow::new(self.database.pool().clone(), self.registry.clone())
    }

    pub fn notice_uow(&self) -> NoticeUow {
        NoticeUow::new(self.database.pool().clone(), self.registry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expired_token_response_carries_renew_hint() {
        let response = error_response(ServiceError::expired_token());
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(RENEW_HEADER).unwrap(),
            RENEW_HEADER_VALUE
        );
    }

    #[tokio::test]
    async fn plain_unauthorized_has_no_renew_hint() {
        let response = error_response(ServiceError::unauthorized());
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(RENEW_HEADER).is_none());
    }

    #[tokio::test]
    async fn internal_faults_collapse_to_unknown_system_error() {
        let response = error_response(ServiceError::DuplicateUnitOfWork);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "UNKNOWN_SYSTEM_ERROR");
    }
}
