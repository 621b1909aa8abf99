mod auth;
mod books;
mod health_check;
mod reviews;

pub use auth::{
    login, logout, me, password_reset_confirm, password_reset_request, refresh, signup,
    verify_email,
};
pub use books::{create_book, delete_book, get_book, list_books, update_book};
pub use health_check::health_check;
pub use reviews::{add_review, delete_review, get_review, list_reviews, update_review};

use actix_web::web;

use crate::auth::{AccessGuard, RoleSet, TokenClaims};
use crate::error::ApiError;
use crate::users::{UserRecord, UserStore};

/// Shared gate for catalog routes: the account behind the token must
/// still exist, be verified, and hold an allowed role.
pub(crate) async fn authorize(
    claims: &TokenClaims,
    guard: &AccessGuard,
    users: &web::Data<dyn UserStore>,
    allowed: &RoleSet,
) -> Result<UserRecord, ApiError> {
    let user = users
        .find_by_id(claims.user_id()?)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    guard.require_verified(&user)?;
    guard.require_role(&user.role, allowed)?;
    Ok(user)
}
