//! Request-scoped authority evaluation.
//!
//! An [`AuthorityChecker`] validates the bearer credential carried by a
//! request and decides whether the caller's claims satisfy a required
//! authority set. A manager passes every check; a checker built with
//! [`AuthorityChecker::manager_only`] passes nobody else.

use axum::http::{HeaderMap, header::AUTHORIZATION};

use crate::auth::models::AccessTokenClaims;
use crate::auth::token::TokenService;
use crate::database::models::Authority;
use crate::errors::{ServiceError, ServiceResult};

/// Header carrying the refresh token on the renewal endpoint. The access
/// token stays in `Authorization`; the two credentials are never conflated.
pub const AUTHORIZATION_R: &str = "AuthorizationR";

/// Extracts `Bearer <credentials>` from the named header.
pub fn bearer_credentials(headers: &HeaderMap, header_name: &str) -> ServiceResult<String> {
    let value = headers
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(ServiceError::unauthorized)?;

    let credentials = value
        .strip_prefix("Bearer ")
        .ok_or_else(ServiceError::unauthorized)?;

    if credentials.is_empty() {
        return Err(ServiceError::unauthorized());
    }
    Ok(credentials.to_string())
}

/// Guard parameterized by a required authority set.
#[derive(Debug, Clone, Default)]
pub struct AuthorityChecker {
    required: Vec<Authority>,
    manager_only: bool,
}

impl AuthorityChecker {
    /// Requires a valid credential but no particular authority.
    pub fn any() -> Self {
        Self::default()
    }

    /// Requires at least one of the given authorities.
    pub fn new(required: impl IntoIterator<Item = Authority>) -> Self {
        AuthorityChecker {
            required: required.into_iter().collect(),
            manager_only: false,
        }
    }

    /// Authorizes only principals with the manager flag set.
    pub fn manager_only() -> Self {
        AuthorityChecker {
            required: Vec::new(),
            manager_only: true,
        }
    }

    /// Validates the `Authorization` bearer token and evaluates authorities.
    ///
    /// A missing or malformed credential fails `Unauthorized`; a credential
    /// that fails signature or expiry checks fails `Unauthorized` with the
    /// `EXPIRED_TOKEN` code so the client knows to attempt a renewal.
    pub fn authorize(
        &self,
        tokens: &TokenService,
        headers: &HeaderMap,
    ) -> ServiceResult<AccessTokenClaims> {
        let credentials = bearer_credentials(headers, AUTHORIZATION.as_str())?;
        if !tokens.is_valid(&credentials) {
            return Err(ServiceError::expired_token());
        }
        let claims = tokens.decode_access(&credentials)?;
        self.check(&claims)?;
        Ok(claims)
    }

    /// Evaluates already-decoded claims against the required set.
    pub fn check(&self, claims: &AccessTokenClaims) -> ServiceResult<()> {
        if claims.manager_flag {
            return Ok(());
        }
        if self.manager_only {
            tracing::warn!(
                principal_id = claims.id,
                "manager-only endpoint refused non-manager principal"
            );
            return Err(ServiceError::forbidden());
        }
        if self.required.is_empty() {
            return Ok(());
        }
        let held = claims.effective_authorities();
        if self.required.iter().any(|authority| held.contains(authority)) {
            return Ok(());
        }

        tracing::warn!(
            principal_id = claims.id,
            required = ?self.required,
            actual = ?claims.authorities,
            "insufficient authorities"
        );
        Err(ServiceError::forbidden())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::AccessTokenClaims;
    use crate::database::models::UserType;
    use std::collections::BTreeSet;
    use std::time::Duration;

    fn claims(manager_flag: bool, authorities: BTreeSet<Authority>) -> AccessTokenClaims {
        AccessTokenClaims {
            id: 1,
            login_id: "admin@example.com".into(),
            name: "Admin".into(),
            user_type: UserType::Admin,
            manager_flag,
            authorities,
        }
    }

    fn tokens() -> TokenService {
        TokenService::with_params(
            "test-secret",
            Duration::from_secs(300),
            Duration::from_secs(1800),
            Duration::from_secs(10),
            false,
        )
    }

    #[test]
    fn manager_bypasses_required_authorities() {
        let checker = AuthorityChecker::new([Authority::AdminEdit, Authority::UserEdit]);
        assert!(checker.check(&claims(true, BTreeSet::new())).is_ok());
    }

    #[test]
    fn disjoint_authorities_are_forbidden() {
        let checker = AuthorityChecker::new([Authority::AdminEdit]);
        let result = checker.check(&claims(false, BTreeSet::from([Authority::NoticeView])));
        assert!(matches!(result, Err(ServiceError::Forbidden { .. })));
    }

    #[test]
    fn overlapping_authorities_pass() {
        let checker = AuthorityChecker::new([Authority::AdminEdit, Authority::AdminView]);
        let result = checker.check(&claims(false, BTreeSet::from([Authority::AdminView])));
        assert!(result.is_ok());
    }

    #[test]
    fn no_required_authorities_passes_any_principal() {
        let checker = AuthorityChecker::any();
        assert!(checker.check(&claims(false, BTreeSet::new())).is_ok());
    }

    #[test]
    fn manager_only_rejects_broad_explicit_authorities() {
        let checker = AuthorityChecker::manager_only();
        let all = Authority::ALL.into_iter().collect();
        assert!(matches!(
            checker.check(&claims(false, all)),
            Err(ServiceError::Forbidden { .. })
        ));
        assert!(checker.check(&claims(true, BTreeSet::new())).is_ok());
    }

    #[test]
    fn missing_credential_is_unauthorized() {
        let checker = AuthorityChecker::any();
        let headers = HeaderMap::new();
        assert!(matches!(
            checker.authorize(&tokens(), &headers),
            Err(ServiceError::Unauthorized { .. })
        ));
    }

    #[test]
    fn malformed_scheme_is_unauthorized() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(matches!(
            AuthorityChecker::any().authorize(&tokens(), &headers),
            Err(ServiceError::Unauthorized { .. })
        ));
    }

    #[test]
    fn invalid_token_signals_renewal() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer bogus".parse().unwrap());
        match AuthorityChecker::any().authorize(&tokens(), &headers) {
            Err(ServiceError::Unauthorized { code }) => {
                assert_eq!(code, crate::errors::Code::ExpiredToken)
            }
            other => panic!("expected unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn valid_token_yields_claims() {
        let svc = tokens();
        let token = svc
            .issue_access_token(&claims(false, BTreeSet::from([Authority::AdminView])))
            .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        let decoded = AuthorityChecker::new([Authority::AdminView])
            .authorize(&svc, &headers)
            .unwrap();
        assert_eq!(decoded.id, 1);
    }
}
