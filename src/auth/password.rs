//! Argon2id password hashing.
//!
//! Hashes are PHC strings carrying their own salt and cost parameters, so
//! verification never needs out-of-band state. Verification runs in time
//! comparable to hashing (tens of milliseconds at default cost), which is
//! the point.

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};

use crate::error::AuthError;

const OP: &str = "auth.password.hash";

/// Hashes `password` with a fresh random salt, returning the PHC string.
pub fn hash(password: &str) -> Result<String, AuthError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| AuthError::internal(OP, e.to_string()))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::internal(OP, e.to_string()))?;

    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::internal(OP, e.to_string()))?
        .to_string();

    Ok(phc)
}

/// Verifies `password` against a stored PHC hash.
///
/// Any malformed hash verifies as false rather than erroring; a corrupt
/// stored hash must not be distinguishable from a wrong password.
pub fn verify(stored: &str, password: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
