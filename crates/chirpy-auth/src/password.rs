use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::error::{AuthError, Result};

/// Hash with Argon2id (default parameters) and a fresh random salt.
/// Returns a PHC string that carries its own salt and parameters.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .to_string();
    Ok(hash)
}

/// Check `candidate` against a stored hash. A stored hash that does not parse
/// counts as a mismatch.
pub fn verify_password(candidate: &str, hash: &str) -> Result<()> {
    let parsed = PasswordHash::new(hash).map_err(|_| AuthError::Mismatch)?;
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .map_err(|_| AuthError::Mismatch)
}
