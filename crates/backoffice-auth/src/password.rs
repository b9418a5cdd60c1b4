//! Password hashing and verification.
//!
//! Passwords are hashed with Argon2id (default parameters, random salt from
//! `OsRng`) and stored in PHC string format.
//!
//! # Example
//!
//! ```
//! use backoffice_auth::password::{hash_password, verify_password};
//!
//! let hash = hash_password("correct horse battery staple").unwrap();
//! assert!(hash.starts_with("$argon2id$"));
//! assert!(verify_password("correct horse battery staple", &hash).unwrap());
//! assert!(!verify_password("wrong", &hash).unwrap());
//! ```

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Errors from password hashing.
#[derive(Debug, thiserror::Error)]
#[error("Password hash error: {0}")]
pub struct PasswordError(#[from] argon2::password_hash::Error);

/// Hash a password for storage.
///
/// # Errors
///
/// Returns `PasswordError` if hashing fails (rare).
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch.
///
/// # Errors
///
/// Returns `PasswordError` only if the stored hash cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Hash checked by [`verify_dummy`]. Built on first use.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("backoffice-dummy-password").ok());

/// Run one Argon2 verification against a throwaway hash.
///
/// Sign-in calls this when there is no stored hash to check, so a rejected
/// unknown account costs the same as a wrong password.
pub fn verify_dummy(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("s3cret", &hash).unwrap());
        assert!(!verify_password("S3cret", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_dummy_hash_is_a_real_hash() {
        let hash = DUMMY_HASH.as_deref().unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!verify_password("", hash).unwrap());
        verify_dummy("anything");
    }

    #[test]
    fn test_invalid_hash_is_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
