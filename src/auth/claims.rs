/// JWT claim set shared by every token this service issues.
///
/// One claims shape covers all four token families; the `type` claim is
/// what separates an access token from a refresh, verification, or
/// password-reset token. Authority comes from the signature plus the
/// revocation check; claims are never persisted.
use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

const JTI_LENGTH: usize = 32;

/// Token family, carried in the `type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenType {
    Access,
    Refresh,
    Verification,
    PasswordReset,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
            TokenType::Verification => write!(f, "verification"),
            TokenType::PasswordReset => write!(f, "password-reset"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// User email
    pub email: String,
    /// User role at issuance time
    pub role: String,
    /// Token family
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token identifier; the revocation key
    pub jti: String,
    /// Issuer
    pub iss: String,
}

impl TokenClaims {
    /// Create new claims with a fresh random jti.
    pub fn new(
        user_id: Uuid,
        email: String,
        role: String,
        token_type: TokenType,
        validity: Duration,
        issuer: String,
    ) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            email,
            role,
            token_type,
            iat: now,
            exp: now + validity.num_seconds(),
            jti: generate_jti(),
            iss: issuer,
        }
    }

    /// Extract the user ID from the subject claim.
    ///
    /// # Errors
    /// Returns an internal error if the subject is not a valid UUID
    /// (cannot happen for tokens this service signed).
    pub fn user_id(&self) -> Result<Uuid, ApiError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| ApiError::Internal("invalid user ID in token subject".to_string()))
    }

    /// Validity left on this token, floored at one second.
    ///
    /// Used as the revocation TTL: once the token would have expired on
    /// its own the blacklist entry has nothing left to protect.
    pub fn remaining_validity(&self) -> Duration {
        let remaining = self.exp - Utc::now().timestamp();
        Duration::seconds(remaining.max(1))
    }

    pub fn is_expired(&self) -> bool {
        self.exp < Utc::now().timestamp()
    }
}

/// Generate a random unique token identifier.
fn generate_jti() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(JTI_LENGTH)
        .map(char::from)
        .collect()
}
