//! Password hashing helpers backed by bcrypt.

use crate::errors::{ServiceError, ServiceResult};
use bcrypt::{DEFAULT_COST, hash, verify};

/// Hashes a plain-text password for storage.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| ServiceError::system_fault(format!("password hashing failed: {e}")))
}

/// Verifies a plain-text password against a stored hash.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    verify(password, hashed).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hashed = hash_password("hunter22").unwrap();
        assert_ne!(hashed, "hunter22");
        assert!(verify_password("hunter22", &hashed));
        assert!(!verify_password("hunter23", &hashed));
    }

    #[test]
    fn verify_tolerates_malformed_hash() {
        assert!(!verify_password("hunter22", "not-a-bcrypt-hash"));
    }
}
