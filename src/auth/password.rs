use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tokio::task;

// Hash checked when a login names no account, so the miss costs one argon2 verify too.
static DUMMY_HASH: OnceCell<String> = OnceCell::new();

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,

    #[error("Password task panicked: {0}")]
    Join(#[from] task::JoinError),
}

fn hash_blocking(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
}

fn verify_blocking(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// Argon2id PHC string for `password`. Runs on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, PasswordError> {
    task::spawn_blocking(move || hash_blocking(&password)).await?
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, PasswordError> {
    task::spawn_blocking(move || verify_blocking(&password, &hash)).await?
}

/// Runs a full verify against a throwaway hash. Always `false`.
pub async fn verify_dummy(password: String) -> Result<bool, PasswordError> {
    task::spawn_blocking(move || {
        let hash = DUMMY_HASH.get_or_try_init(|| hash_blocking("no-such-account"))?;
        verify_blocking(&password, hash).map(|_| false)
    })
    .await?
}
