/// Account and session flow orchestration.
///
/// Composes the password hasher, token codec, revocation store, user
/// store, and mailer into the signup / login / refresh / logout /
/// verification / password-reset flows. Mail dispatch is fire-and-forget
/// relative to the caller: a slow or dead provider degrades to a log
/// line, never to a failed auth response.
use chrono::Utc;
use std::sync::Arc;

use crate::auth::claims::TokenType;
use crate::auth::jwt::TokenCodec;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::revocation::RevocationStore;
use crate::email_client::Mailer;
use crate::error::ApiError;
use crate::users::{NewUser, UserRecord, UserStore, ROLE_USER};

/// Validated signup fields. Input validation happens at the route
/// boundary; by the time fields reach the manager they are well-formed.
#[derive(Debug, Clone)]
pub struct SignupFields {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// The access/refresh pair issued at login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthManager {
    users: Arc<dyn UserStore>,
    revocations: Arc<dyn RevocationStore>,
    codec: TokenCodec,
    mailer: Arc<Mailer>,
}

impl AuthManager {
    pub fn new(
        users: Arc<dyn UserStore>,
        revocations: Arc<dyn RevocationStore>,
        codec: TokenCodec,
        mailer: Arc<Mailer>,
    ) -> Self {
        Self {
            users,
            revocations,
            codec,
            mailer,
        }
    }

    /// Create an unverified account and send the verification email.
    ///
    /// # Errors
    /// Fails with `UserAlreadyExists` when the email is taken.
    pub async fn signup(&self, fields: SignupFields) -> Result<UserRecord, ApiError> {
        if self.users.find_by_email(&fields.email).await?.is_some() {
            return Err(ApiError::UserAlreadyExists);
        }

        let password_hash = hash_password(&fields.password)?;
        let user = self
            .users
            .create(NewUser {
                email: fields.email,
                username: fields.username,
                first_name: fields.first_name,
                last_name: fields.last_name,
                password_hash,
                role: ROLE_USER.to_string(),
            })
            .await?;

        tracing::info!(user_id = %user.id, "user signed up");
        self.dispatch_verification_email(&user);

        Ok(user)
    }

    /// Redeem a verification token. Re-verifying an already-verified
    /// account is a no-op success.
    pub async fn verify_email(&self, token: &str) -> Result<(), ApiError> {
        let claims = self.codec.decode(token)?;
        if claims.token_type != TokenType::Verification {
            return Err(ApiError::InvalidToken);
        }

        let user = self
            .users
            .find_by_id(claims.user_id()?)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        if user.is_verified {
            return Ok(());
        }

        self.users.mark_verified(user.id).await?;
        tracing::info!(user_id = %user.id, "email verified");
        Ok(())
    }

    /// Authenticate with email + password and issue an access/refresh
    /// pair, each carrying a fresh jti.
    ///
    /// Unknown email and wrong password fail identically so callers
    /// cannot enumerate accounts. Verification status is deliberately
    /// not consulted here.
    pub async fn login(&self, email: &str, password: &str) -> Result<(TokenPair, UserRecord), ApiError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(ApiError::InvalidCredentials);
        }

        let settings = self.codec.settings().clone();
        let access_token = self.codec.issue(
            user.id,
            &user.email,
            &user.role,
            TokenType::Access,
            settings.access_validity(),
        )?;
        let refresh_token = self.codec.issue(
            user.id,
            &user.email,
            &user.role,
            TokenType::Refresh,
            settings.refresh_validity(),
        )?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok((
            TokenPair {
                access_token,
                refresh_token,
            },
            user,
        ))
    }

    /// Mint a new access token from a refresh token. The refresh token
    /// itself is not rotated.
    ///
    /// # Errors
    /// `InvalidToken` on decode failure, `RefreshTokenRequired` when
    /// handed any other token family, `RevokedToken` after logout.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, ApiError> {
        let claims = self.codec.decode(refresh_token)?;
        if claims.token_type != TokenType::Refresh {
            return Err(ApiError::RefreshTokenRequired);
        }
        if self.revocations.is_revoked(&claims.jti).await? {
            return Err(ApiError::RevokedToken);
        }

        let access_token = self.codec.issue(
            claims.user_id()?,
            &claims.email,
            &claims.role,
            TokenType::Access,
            self.codec.settings().access_validity(),
        )?;

        tracing::info!(user_id = %claims.sub, "access token refreshed");
        Ok(access_token)
    }

    /// Revoke both tokens of a session immediately, whatever validity
    /// they have left.
    pub async fn logout(&self, access_token: &str, refresh_token: &str) -> Result<(), ApiError> {
        let access = self.codec.decode(access_token)?;
        if access.token_type != TokenType::Access {
            return Err(ApiError::AccessTokenRequired);
        }
        let refresh = self.codec.decode(refresh_token)?;
        if refresh.token_type != TokenType::Refresh {
            return Err(ApiError::RefreshTokenRequired);
        }

        self.revocations
            .revoke(&access.jti, access.remaining_validity())
            .await?;
        self.revocations
            .revoke(&refresh.jti, refresh.remaining_validity())
            .await?;

        tracing::info!(user_id = %access.sub, "user logged out");
        Ok(())
    }

    /// Start a password reset. Always succeeds from the caller's view;
    /// the email is only sent when the account exists.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ApiError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::info!("password reset requested for unknown email");
            return Ok(());
        };

        let token = self.codec.issue(
            user.id,
            &user.email,
            &user.role,
            TokenType::PasswordReset,
            self.codec.settings().password_reset_validity(),
        )?;

        let link = self.mailer.password_reset_link(&token);
        let html = format!(
            "<h1>Reset your password</h1>\
             <p>Click the link below to reset your password:</p>\
             <p><a href=\"{link}\">{link}</a></p>\
             <p>If you did not request this, please ignore this email.</p>"
        );
        self.dispatch_mail(user.email.clone(), "Reset your password".to_string(), html);

        tracing::info!(user_id = %user.id, "password reset email queued");
        Ok(())
    }

    /// Finish a password reset: store the new hash and burn the token.
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), ApiError> {
        if new_password != confirm_password {
            return Err(ApiError::PasswordMismatch);
        }

        let claims = self.codec.decode(token)?;
        if claims.token_type != TokenType::PasswordReset {
            return Err(ApiError::InvalidToken);
        }
        // A redeemed reset token is indistinguishable from a bad one
        if self.revocations.is_revoked(&claims.jti).await? {
            return Err(ApiError::InvalidToken);
        }

        let user = self
            .users
            .find_by_id(claims.user_id()?)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        let password_hash = hash_password(new_password)?;
        self.users.update_password(user.id, password_hash).await?;
        self.revocations
            .revoke(&claims.jti, claims.remaining_validity())
            .await?;

        tracing::info!(user_id = %user.id, "password reset completed");
        Ok(())
    }

    /// Issue a verification token for `user`. Exposed for re-sending;
    /// signup calls it internally.
    pub fn issue_verification_token(&self, user: &UserRecord) -> Result<String, ApiError> {
        self.codec.issue(
            user.id,
            &user.email,
            &user.role,
            TokenType::Verification,
            self.codec.settings().verification_validity(),
        )
    }

    fn dispatch_verification_email(&self, user: &UserRecord) {
        let token = match self.issue_verification_token(user) {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "failed to issue verification token");
                return;
            }
        };

        let link = self.mailer.verification_link(&token);
        let html = format!(
            "<h1>Verify your email</h1>\
             <p>Welcome! Click the link below to verify your account:</p>\
             <p><a href=\"{link}\">{link}</a></p>"
        );
        self.dispatch_mail(user.email.clone(), "Verify your email".to_string(), html);
    }

    /// Fire-and-forget mail send; the HTTP response never waits on a
    /// mail provider.
    fn dispatch_mail(&self, recipient: String, subject: String, html: String) {
        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            let started = Utc::now();
            let sent = mailer.send(&[recipient], &subject, &html).await;
            if !sent {
                tracing::error!(
                    subject = %subject,
                    elapsed_ms = (Utc::now() - started).num_milliseconds(),
                    "mail dispatch failed"
                );
            }
        });
    }
}
