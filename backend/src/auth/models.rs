//! Data structures for authentication-related entities.
//!
//! This module defines the JWT claim sets and the token pair returned by
//! login and renewal endpoints.

use crate::database::models::{Authority, UserType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Claims embedded in an access token. Short-lived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub id: i64,
    pub login_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub manager_flag: bool,
    pub authorities: BTreeSet<Authority>,
}

impl AccessTokenClaims {
    /// Effective authority set; a manager holds every authority implicitly.
    pub fn effective_authorities(&self) -> BTreeSet<Authority> {
        if self.manager_flag {
            Authority::ALL.into_iter().collect()
        } else {
            self.authorities.clone()
        }
    }
}

/// Claims embedded in a refresh token; only the principal id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub id: i64,
}

/// Token pair returned by login and renewal.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
