//! Password hashing (bcrypt)

use crate::error::AppError;

/// Hash a plaintext password with a random salt
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    bcrypt::hash(password, cost).map_err(|e| AppError::Internal(e.into()))
}

/// Check a plaintext password against a stored hash
///
/// Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
