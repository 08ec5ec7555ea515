//! Argon2id password hashing with the crate's default parameters.

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

lazy_static! {
    /// Stand-in hash for accounts that do not exist, so a login for an
    /// unknown email costs one Argon2 verification like a wrong password.
    static ref DUMMY_HASH: Option<String> = hash_password("no-such-account").ok();
}

fn argon2_failure(op: &'static str) -> impl FnOnce(password_hash::Error) -> anyhow::Error {
    move |e| {
        error!(error = %e, op, "argon2 failure");
        anyhow::anyhow!("{op}: {e}")
    }
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(argon2_failure("hash password"))
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(argon2_failure("parse password hash"))?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(argon2_failure("verify password")(e)),
    }
}

/// Checks a login attempt against an account that may be missing. A missing
/// account never matches but still pays for a verification.
pub fn verify_credentials(plain: &str, stored_hash: Option<&str>) -> anyhow::Result<bool> {
    match stored_hash {
        Some(hash) => verify_password(plain, hash),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(plain, dummy);
            }
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_hash_is_phc_argon2id_and_salted() {
        let a = hash_password("pw123456").unwrap();
        let b = hash_password("pw123456").unwrap();
        assert!(a.starts_with("$argon2id$"));
        assert_ne!(a, b);
        assert!(verify_password("pw123456", &a).unwrap());
        assert!(verify_password("pw123456", &b).unwrap());
    }

    #[test]
    fn mismatch_is_false_not_error() {
        let hash = hash_password("12345678").unwrap();
        assert!(!verify_password("87654321", &hash).unwrap());
    }

    #[test]
    fn unusable_hash_is_an_error() {
        assert!(verify_password("anything", "plaintext-password").is_err());
        assert!(verify_password("anything", "").is_err());
    }

    #[test]
    fn missing_account_never_matches() {
        assert!(DUMMY_HASH.is_some());
        assert!(!verify_credentials("no-such-account", None).unwrap());
        assert!(!verify_credentials("", None).unwrap());
    }

    #[test]
    fn existing_account_uses_its_own_hash() {
        let hash = hash_password("pw123456").unwrap();
        assert!(verify_credentials("pw123456", Some(&hash)).unwrap());
        assert!(!verify_credentials("pw1234567", Some(&hash)).unwrap());
    }
}
