/// Account and session routes.
///
/// Handlers validate input at the boundary, then delegate every decision
/// to the auth manager; failures bubble up as `ApiError` and map to the
/// documented JSON error bodies.
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthManager, SignupFields, TokenClaims};
use crate::configuration::JwtSettings;
use crate::error::ApiError;
use crate::users::{UserRecord, UserStore};
use crate::validators::{is_valid_email, is_valid_name, is_valid_password, is_valid_username};

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct VerifyQuery {
    pub token: String,
}

#[derive(Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct PasswordResetConfirmRequest {
    pub new_password: String,
    pub confirm_new_password: String,
}

/// Login response: both tokens plus the authenticated user.
#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: UserRecord,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// POST /api/v1/users/signup
///
/// Creates an unverified account and queues the verification email.
/// 201 with the new user on success, 403 `user_exists` on duplicates.
pub async fn signup(
    form: web::Json<SignupRequest>,
    manager: web::Data<AuthManager>,
) -> Result<HttpResponse, ApiError> {
    let fields = SignupFields {
        email: is_valid_email(&form.email)?,
        username: is_valid_username(&form.username)?,
        first_name: is_valid_name("first_name", &form.first_name)?,
        last_name: is_valid_name("last_name", &form.last_name)?,
        password: {
            is_valid_password(&form.password)?;
            form.password.clone()
        },
    };

    let user = manager.signup(fields).await?;
    Ok(HttpResponse::Created().json(user))
}

/// GET /api/v1/users/verify?token=...
///
/// Redeems the emailed verification token.
pub async fn verify_email(
    query: web::Query<VerifyQuery>,
    manager: web::Data<AuthManager>,
) -> Result<HttpResponse, ApiError> {
    manager.verify_email(&query.token).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Account verified successfully"
    })))
}

/// POST /api/v1/users/login
///
/// Unknown email and wrong password return the same error body, so the
/// endpoint cannot be used to enumerate accounts.
pub async fn login(
    form: web::Json<LoginRequest>,
    manager: web::Data<AuthManager>,
    jwt: web::Data<JwtSettings>,
) -> Result<HttpResponse, ApiError> {
    let email = form.email.trim().to_lowercase();
    let (pair, user) = manager.login(&email, &form.password).await?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer",
        expires_in: jwt.access_token_expiry,
        user,
    }))
}

/// POST /api/v1/users/refresh
///
/// Mints a new access token; the refresh token stays valid as-is.
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    manager: web::Data<AuthManager>,
    jwt: web::Data<JwtSettings>,
) -> Result<HttpResponse, ApiError> {
    let access_token = manager.refresh(&form.refresh_token).await?;

    Ok(HttpResponse::Ok().json(RefreshResponse {
        access_token,
        token_type: "Bearer",
        expires_in: jwt.access_token_expiry,
    }))
}

/// POST /api/v1/users/logout
///
/// Takes the access token from the Authorization header and the refresh
/// token from the body; revokes both immediately.
pub async fn logout(
    req: HttpRequest,
    form: web::Json<LogoutRequest>,
    manager: web::Data<AuthManager>,
) -> Result<HttpResponse, ApiError> {
    let access_token = bearer_token(&req)?;
    manager.logout(&access_token, &form.refresh_token).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Logged out successfully"
    })))
}

/// GET /api/v1/users/me
///
/// Claims are injected by the bearer middleware; the record is loaded
/// fresh so role or verification changes show up immediately.
pub async fn me(
    claims: web::ReqData<TokenClaims>,
    users: web::Data<dyn UserStore>,
) -> Result<HttpResponse, ApiError> {
    let user = users
        .find_by_id(claims.user_id()?)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    Ok(HttpResponse::Ok().json(user))
}

/// POST /api/v1/users/password-reset-request
///
/// Always 200; whether an email goes out depends on the account
/// existing, which the response never reveals.
pub async fn password_reset_request(
    form: web::Json<PasswordResetRequest>,
    manager: web::Data<AuthManager>,
) -> Result<HttpResponse, ApiError> {
    let email = form.email.trim().to_lowercase();
    manager.request_password_reset(&email).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Please check your email for instructions to reset your password"
    })))
}

/// POST /api/v1/users/password-reset-confirm/{token}
pub async fn password_reset_confirm(
    path: web::Path<String>,
    form: web::Json<PasswordResetConfirmRequest>,
    manager: web::Data<AuthManager>,
) -> Result<HttpResponse, ApiError> {
    let token = path.into_inner();

    // Mismatch outranks a weak password; bounds are only checked once
    // the two fields agree.
    if form.new_password == form.confirm_new_password {
        is_valid_password(&form.new_password)?;
    }
    manager
        .confirm_password_reset(&token, &form.new_password, &form.confirm_new_password)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Password reset successfully"
    })))
}

/// Extract the bearer token from the Authorization header.
fn bearer_token(req: &HttpRequest) -> Result<String, ApiError> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
        .ok_or(ApiError::AccessTokenRequired)
}
