/// Per-request access decisions.
///
/// The guard sits between the codec and route handlers: it settles
/// cryptographic validity first, then revocation, then token family,
/// and separately answers role and verification questions. Which
/// operations demand a verified account is the caller's decision.
use std::sync::Arc;

use crate::auth::claims::{TokenClaims, TokenType};
use crate::auth::jwt::TokenCodec;
use crate::auth::revocation::RevocationStore;
use crate::error::ApiError;
use crate::users::UserRecord;

/// Ordered set of role names allowed on a route. Must be non-empty;
/// membership is required for access.
#[derive(Debug, Clone)]
pub struct RoleSet {
    roles: Vec<String>,
}

impl RoleSet {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles: Vec<String> = roles.into_iter().map(Into::into).collect();
        debug_assert!(!roles.is_empty(), "a role set must not be empty");
        Self { roles }
    }

    pub fn contains(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

pub struct AccessGuard {
    codec: TokenCodec,
    revocations: Arc<dyn RevocationStore>,
}

impl AccessGuard {
    pub fn new(codec: TokenCodec, revocations: Arc<dyn RevocationStore>) -> Self {
        Self { codec, revocations }
    }

    /// Validate a bearer token as an access token.
    ///
    /// # Errors
    /// `InvalidToken` on decode failure, `RevokedToken` when the jti is
    /// blacklisted, `AccessTokenRequired` for any other token family.
    pub async fn require_access_token(&self, token: &str) -> Result<TokenClaims, ApiError> {
        let claims = self.codec.decode(token)?;
        if self.revocations.is_revoked(&claims.jti).await? {
            return Err(ApiError::RevokedToken);
        }
        if claims.token_type != TokenType::Access {
            return Err(ApiError::AccessTokenRequired);
        }
        Ok(claims)
    }

    /// Validate a bearer token as a refresh token.
    pub async fn require_refresh_token(&self, token: &str) -> Result<TokenClaims, ApiError> {
        let claims = self.codec.decode(token)?;
        if self.revocations.is_revoked(&claims.jti).await? {
            return Err(ApiError::RevokedToken);
        }
        if claims.token_type != TokenType::Refresh {
            return Err(ApiError::RefreshTokenRequired);
        }
        Ok(claims)
    }

    /// The identity's role must be a member of the allowed set.
    pub fn require_role(&self, role: &str, allowed: &RoleSet) -> Result<(), ApiError> {
        if allowed.contains(role) {
            Ok(())
        } else {
            Err(ApiError::InsufficientPermission)
        }
    }

    /// The account must have redeemed its verification email.
    pub fn require_verified(&self, user: &UserRecord) -> Result<(), ApiError> {
        if user.is_verified {
            Ok(())
        } else {
            Err(ApiError::AccountNotVerified)
        }
    }
}
