//! Admin account commands.
//!
//! # Usage
//!
//! ```bash
//! # Print the value for ADMIN_PASSWORD_HASH
//! frenos admin hash-password 'una contraseña larga'
//! ```

use frenos_admin::services::PasswordError;
use frenos_admin::services::password::hash_password;

/// Hash a password for `ADMIN_PASSWORD_HASH`.
///
/// # Errors
///
/// Returns an error if the password is too short or hashing fails.
pub fn hash(password: &str) -> Result<String, PasswordError> {
    hash_password(password)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_phc_string() {
        let hash = hash("una contraseña larga").unwrap();
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(hash("corta"), Err(PasswordError::TooShort)));
    }
}
