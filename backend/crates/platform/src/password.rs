//! Password Hashing and Verification
//!
//! bcrypt-based credential handling:
//! - NFKC normalisation before hashing
//! - Zeroization of clear text on drop
//! - Constant-time verification (inside `bcrypt::verify`)
//!
//! bcrypt only looks at the first 72 bytes of input, so longer passwords are
//! rejected instead of being silently truncated.

use std::fmt;

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

// ============================================================================
// Constants
// ============================================================================

/// Minimum password length in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length in bytes (bcrypt input limit)
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Work factor used for new hashes
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

// ============================================================================
// Error Types
// ============================================================================

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} bytes (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    #[error("Password contains invalid control characters")]
    InvalidCharacter,
}

/// Password hashing/verification errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(#[from] bcrypt::BcryptError),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// Does not implement `Clone`; `Debug` is redacted.
///
/// ```rust
/// use platform::password::ClearTextPassword;
///
/// let password = ClearTextPassword::new("correct horse".to_string()).unwrap();
/// let hash = password.hash_with_cost(4).unwrap();
/// assert!(hash.verify(&password));
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Create a new clear text password with policy validation
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let normalized: String = raw.nfkc().collect();

        if normalized.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        if normalized.chars().any(|c| c.is_control()) {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        let char_count = normalized.chars().count();
        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if normalized.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_BYTES,
                actual: normalized.len(),
            });
        }

        Ok(Self(normalized))
    }

    /// Wrap without policy checks (login path: the stored hash decides)
    pub fn new_unchecked(raw: String) -> Self {
        Self(raw.nfkc().collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hash with the default work factor
    pub fn hash(&self) -> Result<HashedPassword, PasswordHashError> {
        self.hash_with_cost(DEFAULT_COST)
    }

    pub fn hash_with_cost(&self, cost: u32) -> Result<HashedPassword, PasswordHashError> {
        Ok(HashedPassword(bcrypt::hash(&self.0, cost)?))
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClearTextPassword([REDACTED])")
    }
}

// ============================================================================
// Hashed Password
// ============================================================================

/// bcrypt hash in modular crypt format (`$2b$...`)
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Restore from the stored string
    pub fn from_hash_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let s = s.into();
        if !(s.starts_with("$2a$") || s.starts_with("$2b$") || s.starts_with("$2y$")) {
            return Err(PasswordHashError::InvalidHashFormat);
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verify a password; malformed hashes never match
    pub fn verify(&self, password: &ClearTextPassword) -> bool {
        bcrypt::verify(password.as_str(), &self.0).unwrap_or(false)
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 最小コストでテストを高速化
    const TEST_COST: u32 = 4;

    #[test]
    fn test_password_too_short() {
        let result = ClearTextPassword::new("short".to_string());
        assert!(matches!(result, Err(PasswordPolicyError::TooShort { .. })));
    }

    #[test]
    fn test_password_too_long() {
        let result = ClearTextPassword::new("a".repeat(73));
        assert!(matches!(result, Err(PasswordPolicyError::TooLong { .. })));
    }

    #[test]
    fn test_password_whitespace_only() {
        let result = ClearTextPassword::new("          ".to_string());
        assert_eq!(result.unwrap_err(), PasswordPolicyError::EmptyOrWhitespace);
    }

    #[test]
    fn test_password_control_character() {
        let result = ClearTextPassword::new("abc\u{0007}defgh".to_string());
        assert_eq!(result.unwrap_err(), PasswordPolicyError::InvalidCharacter);
    }

    #[test]
    fn test_hash_and_verify() {
        let password = ClearTextPassword::new("backoffice-pass".to_string()).unwrap();
        let hash = password.hash_with_cost(TEST_COST).unwrap();
        assert!(hash.verify(&password));

        let wrong = ClearTextPassword::new_unchecked("backoffice-fail".to_string());
        assert!(!hash.verify(&wrong));
    }

    #[test]
    fn test_hash_string_roundtrip() {
        let password = ClearTextPassword::new("backoffice-pass".to_string()).unwrap();
        let hash = password.hash_with_cost(TEST_COST).unwrap();
        let restored = HashedPassword::from_hash_string(hash.as_str()).unwrap();
        assert!(restored.verify(&password));
    }

    #[test]
    fn test_invalid_hash_string() {
        assert!(HashedPassword::from_hash_string("$argon2id$v=19$...").is_err());
    }

    #[test]
    fn test_debug_redaction() {
        let password = ClearTextPassword::new("backoffice-pass".to_string()).unwrap();
        assert!(!format!("{:?}", password).contains("backoffice"));
    }
}
