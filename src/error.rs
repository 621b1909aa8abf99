/// Unified error handling for the API.
///
/// Every failure a caller can recover from is a variant of [`ApiError`]
/// and maps to a 4xx response with a stable `error_code`. Anything
/// unexpected is folded into `Internal`, logged with full context, and
/// returned to the caller as a generic 500 with no internal detail.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// Validation errors for input data
#[derive(Debug, Clone)]
pub enum ValidationError {
    EmptyField(&'static str),
    TooShort(&'static str, usize),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
        }
    }
}

impl StdError for ValidationError {}

/// Request-scoped, recoverable-by-caller failures.
///
/// Credential failures are deliberately indistinguishable
/// (`InvalidCredentials` covers both unknown email and wrong password);
/// token failures are distinguishable because they aid legitimate client
/// retry logic and carry no enumeration risk.
#[derive(Debug)]
pub enum ApiError {
    /// Token signature mismatch, malformed payload, or expiry passed
    InvalidToken,
    /// Token whose jti has been revoked before its natural expiry
    RevokedToken,
    /// A refresh (or other) token was presented where an access token is needed
    AccessTokenRequired,
    /// An access (or other) token was presented where a refresh token is needed
    RefreshTokenRequired,
    /// Signup with an email that already has an account
    UserAlreadyExists,
    /// Unknown email or wrong password; never reveals which
    InvalidCredentials,
    /// Identity role is not in the route's allowed role set
    InsufficientPermission,
    UserNotFound,
    BookNotFound,
    ReviewNotFound,
    /// Operation requires a verified account
    AccountNotVerified,
    /// Password-reset confirmation with non-matching passwords
    PasswordMismatch,
    Validation(ValidationError),
    /// Unexpected internal failure; detail is logged, never returned
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidToken => write!(f, "token is invalid or expired"),
            ApiError::RevokedToken => write!(f, "token has been revoked"),
            ApiError::AccessTokenRequired => write!(f, "access token required"),
            ApiError::RefreshTokenRequired => write!(f, "refresh token required"),
            ApiError::UserAlreadyExists => write!(f, "user with email already exists"),
            ApiError::InvalidCredentials => write!(f, "invalid email or password"),
            ApiError::InsufficientPermission => {
                write!(f, "not allowed to perform this action")
            }
            ApiError::UserNotFound => write!(f, "user not found"),
            ApiError::BookNotFound => write!(f, "book not found"),
            ApiError::ReviewNotFound => write!(f, "review not found"),
            ApiError::AccountNotVerified => write!(f, "account not verified"),
            ApiError::PasswordMismatch => write!(f, "passwords do not match"),
            ApiError::Validation(e) => write!(f, "{}", e),
            ApiError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl StdError for ApiError {}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

/// JSON body returned for every error response
#[derive(Debug, serde::Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub error_code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<&'static str>,
}

impl ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            ApiError::InvalidToken => "invalid_token",
            ApiError::RevokedToken => "token_revoked",
            ApiError::AccessTokenRequired => "access_token_required",
            ApiError::RefreshTokenRequired => "refresh_token_required",
            ApiError::UserAlreadyExists => "user_exists",
            ApiError::InvalidCredentials => "invalid_email_or_password",
            ApiError::InsufficientPermission => "insufficient_permission",
            ApiError::UserNotFound => "user_not_found",
            ApiError::BookNotFound => "book_not_found",
            ApiError::ReviewNotFound => "review_not_found",
            ApiError::AccountNotVerified => "account_not_verified",
            ApiError::PasswordMismatch => "passwords_do_not_match",
            ApiError::Validation(_) => "validation_error",
            ApiError::Internal(_) => "server_error",
        }
    }

    fn resolution(&self) -> Option<&'static str> {
        match self {
            ApiError::InvalidToken | ApiError::RevokedToken => Some("Please get a new token"),
            ApiError::AccessTokenRequired => Some("Please provide a valid access token"),
            ApiError::RefreshTokenRequired => Some("Please provide a valid refresh token"),
            ApiError::InsufficientPermission => Some("Upgrade role"),
            ApiError::AccountNotVerified => Some("Check email for verification details"),
            _ => None,
        }
    }

    fn public_message(&self) -> String {
        match self {
            // Never leak internal detail to the caller
            ApiError::Internal(_) => "Oops!.. something went wrong".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidToken
            | ApiError::RevokedToken
            | ApiError::AccessTokenRequired
            | ApiError::RefreshTokenRequired => StatusCode::UNAUTHORIZED,
            ApiError::UserAlreadyExists
            | ApiError::InsufficientPermission
            | ApiError::AccountNotVerified => StatusCode::FORBIDDEN,
            ApiError::UserNotFound | ApiError::BookNotFound | ApiError::ReviewNotFound => {
                StatusCode::NOT_FOUND
            }
            ApiError::InvalidCredentials
            | ApiError::PasswordMismatch
            | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
            }
            ApiError::Validation(e) => {
                tracing::warn!(error = %e, "validation error");
            }
            other => {
                tracing::warn!(error = %other, error_code = other.error_code(), "request failed");
            }
        }

        HttpResponse::build(self.status_code()).json(ErrorBody {
            message: self.public_message(),
            error_code: self.error_code(),
            resolution: self.resolution(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display() {
        let err = ValidationError::EmptyField("email");
        assert_eq!(err.to_string(), "email is empty");
    }

    #[test]
    fn token_errors_map_to_unauthorized() {
        for err in [
            ApiError::InvalidToken,
            ApiError::RevokedToken,
            ApiError::AccessTokenRequired,
            ApiError::RefreshTokenRequired,
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn credential_failure_is_a_bad_request() {
        assert_eq!(
            ApiError::InvalidCredentials.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn internal_error_hides_detail() {
        let err = ApiError::Internal("connection pool exhausted".to_string());
        assert_eq!(err.public_message(), "Oops!.. something went wrong");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_error_converts() {
        let err: ApiError = ValidationError::InvalidFormat("email").into();
        match err {
            ApiError::Validation(_) => (),
            other => panic!("expected Validation, got {:?}", other),
        }
    }
}
