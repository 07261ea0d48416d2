//! JWT token utilities for authentication and authorization.
//!
//! Provides token creation and validation for access and refresh tokens.
//! Any structural, cryptographic or expiry failure surfaces as a single
//! `Unauthorized` kind; callers never distinguish "expired" from "malformed"
//! at this layer.

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

use crate::auth::models::{AccessTokenClaims, RefreshTokenClaims};
use crate::config::{Config, DeploymentEnvironment};
use crate::errors::{ServiceError, ServiceResult};

/// Wire format: the claim set plus the standard numeric expiry claim.
#[derive(Debug, Serialize, Deserialize)]
struct SignedClaims<T> {
    #[serde(flatten)]
    claims: T,
    exp: i64,
}

/// Expiry-only view used for liveness and grace-window checks.
#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: i64,
}

/// Issues, validates and decodes signed access/refresh tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
    grace_window: Duration,
    test_mode: bool,
}

impl TokenService {
    pub fn new(config: &Config) -> Self {
        Self::with_params(
            &config.jwt_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
            config.refresh_grace_window,
            config.deployment_environment == DeploymentEnvironment::Test,
        )
    }

    pub fn with_params(
        secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
        grace_window: Duration,
        test_mode: bool,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // The grace-window comparison needs second-accurate expiries.
        validation.leeway = 0;

        TokenService {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl,
            refresh_ttl,
            grace_window,
            test_mode,
        }
    }

    fn issue<T: Serialize>(&self, claims: &T, ttl: Duration) -> ServiceResult<String> {
        let exp = (Utc::now() + ChronoDuration::from_std(ttl).unwrap_or_default()).timestamp();
        let signed = SignedClaims { claims, exp };
        encode(&Header::default(), &signed, &self.encoding_key)
            .map_err(|_| ServiceError::system_fault("token signing failed"))
    }

    fn decode_claims<T: DeserializeOwned>(&self, token: &str) -> ServiceResult<T> {
        decode::<SignedClaims<T>>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.claims)
            .map_err(|_| ServiceError::unauthorized())
    }

    /// Serializes the claims with `exp = now + access_ttl` and signs them.
    pub fn issue_access_token(&self, claims: &AccessTokenClaims) -> ServiceResult<String> {
        self.issue(claims, self.access_ttl)
    }

    /// Serializes the claims with `exp = now + refresh_ttl` and signs them.
    pub fn issue_refresh_token(&self, claims: &RefreshTokenClaims) -> ServiceResult<String> {
        self.issue(claims, self.refresh_ttl)
    }

    /// Verifies signature and expiry, then returns the access-token claims.
    pub fn decode_access(&self, token: &str) -> ServiceResult<AccessTokenClaims> {
        self.decode_claims(token)
    }

    /// Verifies signature and expiry, then returns the refresh-token claims.
    pub fn decode_refresh(&self, token: &str) -> ServiceResult<RefreshTokenClaims> {
        self.decode_claims(token)
    }

    /// Non-throwing liveness check used against the server-stored token.
    pub fn is_valid(&self, token: &str) -> bool {
        decode::<ExpiryClaims>(token, &self.decoding_key, &self.validation).is_ok()
    }

    /// True when the token's remaining lifetime is within the grace threshold
    /// of the nominal refresh TTL, i.e. the token was issued just now.
    ///
    /// Two renewal calls racing inside this window both keep the stored
    /// refresh token instead of rotating it. Always false under the test
    /// deployment environment.
    pub fn issued_within_grace_window(&self, token: &str) -> bool {
        if self.test_mode {
            return false;
        }
        let exp = match decode::<ExpiryClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data.claims.exp,
            Err(_) => return false,
        };
        let nominal_exp = (Utc::now()
            + ChronoDuration::from_std(self.refresh_ttl).unwrap_or_default())
        .timestamp();
        nominal_exp - exp < self.grace_window.as_secs() as i64
    }
}
