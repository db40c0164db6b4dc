//! Password hashing for local accounts.
//!
//! Passwords are stored as Argon2id PHC strings. Hashing is CPU-bound, so the
//! async wrappers run it on the blocking thread-pool.

use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("hashing task failed: {0}")]
    Join(String),
}

/// Hash `password` with a fresh random salt.
pub fn hash_password_sync(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hash(e.to_string()))
}

/// `true` if `password` matches the stored PHC `hash`. A malformed hash never matches.
pub fn verify_password_sync(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub async fn hash_password(password: &str) -> Result<String, CredentialError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password_sync(&password))
        .await
        .map_err(|e| CredentialError::Join(e.to_string()))?
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool, CredentialError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || verify_password_sync(&password, &hash))
        .await
        .map_err(|e| CredentialError::Join(e.to_string()))
}
