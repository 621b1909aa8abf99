/// Password hashing and verification with bcrypt.
use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::ApiError;

/// Hash a plaintext password. Salting is internal to bcrypt, so hashing
/// the same input twice yields different strings that both verify.
///
/// # Errors
/// Returns an internal error if bcrypt fails.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
}

/// Verify a plaintext password against a stored hash.
///
/// A malformed hash verifies as `false` rather than erroring; callers
/// treat every non-match the same way.
pub fn verify_password(password: &str, hash: &str) -> bool {
    verify(password, hash).unwrap_or(false)
}
