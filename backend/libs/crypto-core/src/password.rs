/// Password hashing and verification using Argon2id
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Invalid password hash format: {0}")]
    MalformedHash(String),
}

/// Hash a password using Argon2id algorithm
///
/// ## Security
///
/// - Algorithm: Argon2id (default configuration)
/// - Salt: Random 16-byte salt generated per password
///
/// ## Returns
///
/// PHC-formatted hash string safe for database storage
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Verify a password against its hash
///
/// Returns `Ok(false)` for a wrong password and `Err` only when the stored
/// hash cannot be parsed or verification itself fails.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Hash(e.to_string())),
    }
}
