/// Signed token encoding and decoding.
///
/// The codec owns the signing configuration: the secret is injected at
/// construction, never read from ambient state. It decides cryptographic
/// validity only; revocation is a business-level concern that belongs to
/// the access guard.
use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{TokenClaims, TokenType};
use crate::configuration::JwtSettings;
use crate::error::ApiError;

#[derive(Clone)]
pub struct TokenCodec {
    settings: JwtSettings,
}

impl TokenCodec {
    /// Exactly one secret is active at a time; rotating it invalidates
    /// all outstanding tokens.
    pub fn new(settings: JwtSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &JwtSettings {
        &self.settings
    }

    /// Sign a token for `user_id` with a fresh jti and
    /// `exp = now + validity`.
    ///
    /// # Errors
    /// Returns an internal error if signing fails.
    pub fn issue(
        &self,
        user_id: Uuid,
        email: &str,
        role: &str,
        token_type: TokenType,
        validity: Duration,
    ) -> Result<String, ApiError> {
        let claims = TokenClaims::new(
            user_id,
            email.to_string(),
            role.to_string(),
            token_type,
            validity,
            self.settings.issuer.clone(),
        );
        self.encode(&claims)
    }

    /// Sign an already-built claim set.
    pub fn encode(&self, claims: &TokenClaims) -> Result<String, ApiError> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.settings.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("token generation failed: {}", e)))
    }

    /// Verify signature, structure, expiry, and issuer.
    ///
    /// # Errors
    /// Fails with `InvalidToken` on signature mismatch, malformed
    /// payload, or passed expiry. Never consults the revocation store.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, ApiError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.settings.issuer]);

        decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.settings.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::warn!(error = %e, "token validation failed");
            ApiError::InvalidToken
        })
    }
}
