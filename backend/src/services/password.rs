//! Password hashing.

use crate::error::{AppError, Result};

/// bcrypt with a fixed work factor
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        bcrypt::hash(plaintext, self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against a stored hash
    pub fn verify(&self, plaintext: &str, hash: &str) -> Result<bool> {
        bcrypt::verify(plaintext, hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash("password123").unwrap();
        assert_ne!(hash, "password123");
        assert!(hasher.verify("password123", &hash).unwrap());
        assert!(!hasher.verify("password124", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = PasswordHasher::new(4);
        assert_ne!(hasher.hash("hunter2pass").unwrap(), hasher.hash("hunter2pass").unwrap());
    }

    #[test]
    fn test_garbage_hash_is_internal_error() {
        let err = PasswordHasher::new(4).verify("x", "not-a-hash").unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
