//! Admin password hashing with Argon2id.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    TooShort,

    #[error("failed to hash password")]
    Hash,

    #[error("invalid credentials")]
    InvalidCredentials,
}

/// Hash a password using Argon2id, producing a PHC string.
///
/// # Errors
///
/// Returns an error if the password is too short or hashing fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordError::Hash)
}

/// Verify a password against a PHC hash.
///
/// # Errors
///
/// Returns [`PasswordError::InvalidCredentials`] on mismatch or a malformed hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("pastillas-de-freno").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("pastillas-de-freno", &hash).is_ok());
        assert!(matches!(
            verify_password("otra-clave", &hash),
            Err(PasswordError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(hash_password("corta"), Err(PasswordError::TooShort)));
    }

    #[test]
    fn test_malformed_hash_is_invalid() {
        assert!(matches!(
            verify_password("x", "not-a-hash"),
            Err(PasswordError::InvalidCredentials)
        ));
    }
}
