/// Review routes. A review always hangs off an existing book and a
/// verified account; updates address a review by book AND review uid.
use actix_web::{web, HttpResponse};
use lazy_static::lazy_static;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{AccessGuard, RoleSet, TokenClaims};
use crate::catalog::{BookStore, NewReview, ReviewStore, ReviewUpdate};
use crate::error::{ApiError, ValidationError};
use crate::routes::authorize;
use crate::users::UserStore;

lazy_static! {
    static ref REVIEW_ROLES: RoleSet = RoleSet::new(["admin", "user"]);
}

const MAX_RATING: u8 = 5;

#[derive(Deserialize)]
pub struct ReviewCreateRequest {
    pub rating: u8,
    pub review_text: String,
}

fn check_rating(rating: u8) -> Result<(), ApiError> {
    if (1..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat("rating").into())
    }
}

/// POST /api/v1/reviews/book/{book_uid}
pub async fn add_review(
    claims: web::ReqData<TokenClaims>,
    guard: web::Data<AccessGuard>,
    users: web::Data<dyn UserStore>,
    books: web::Data<dyn BookStore>,
    reviews: web::Data<dyn ReviewStore>,
    path: web::Path<Uuid>,
    form: web::Json<ReviewCreateRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = authorize(&claims, &guard, &users, &REVIEW_ROLES).await?;
    check_rating(form.rating)?;

    let book_uid = path.into_inner();
    if books.get(book_uid).await?.is_none() {
        return Err(ApiError::BookNotFound);
    }

    let review = reviews
        .insert(NewReview {
            rating: form.rating,
            review_text: form.review_text.trim().to_string(),
            user_uid: user.id,
            book_uid,
        })
        .await?;

    tracing::info!(review_uid = %review.uid, book_uid = %book_uid, "review added");
    Ok(HttpResponse::Created().json(review))
}

/// GET /api/v1/reviews
pub async fn list_reviews(
    claims: web::ReqData<TokenClaims>,
    guard: web::Data<AccessGuard>,
    users: web::Data<dyn UserStore>,
    reviews: web::Data<dyn ReviewStore>,
) -> Result<HttpResponse, ApiError> {
    authorize(&claims, &guard, &users, &REVIEW_ROLES).await?;
    let all = reviews.list().await?;
    Ok(HttpResponse::Ok().json(all))
}

/// GET /api/v1/reviews/{review_uid}
pub async fn get_review(
    claims: web::ReqData<TokenClaims>,
    guard: web::Data<AccessGuard>,
    users: web::Data<dyn UserStore>,
    reviews: web::Data<dyn ReviewStore>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    authorize(&claims, &guard, &users, &REVIEW_ROLES).await?;
    let review = reviews
        .get(path.into_inner())
        .await?
        .ok_or(ApiError::ReviewNotFound)?;
    Ok(HttpResponse::Ok().json(review))
}

/// PATCH /api/v1/reviews/book/{book_uid}/{review_uid}
pub async fn update_review(
    claims: web::ReqData<TokenClaims>,
    guard: web::Data<AccessGuard>,
    users: web::Data<dyn UserStore>,
    reviews: web::Data<dyn ReviewStore>,
    path: web::Path<(Uuid, Uuid)>,
    form: web::Json<ReviewUpdate>,
) -> Result<HttpResponse, ApiError> {
    authorize(&claims, &guard, &users, &REVIEW_ROLES).await?;
    if let Some(rating) = form.rating {
        check_rating(rating)?;
    }

    let (book_uid, review_uid) = path.into_inner();
    let review = reviews
        .update(book_uid, review_uid, form.into_inner())
        .await?
        .ok_or(ApiError::ReviewNotFound)?;

    Ok(HttpResponse::Ok().json(review))
}

/// DELETE /api/v1/reviews/{review_uid}
pub async fn delete_review(
    claims: web::ReqData<TokenClaims>,
    guard: web::Data<AccessGuard>,
    users: web::Data<dyn UserStore>,
    reviews: web::Data<dyn ReviewStore>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    authorize(&claims, &guard, &users, &REVIEW_ROLES).await?;
    if !reviews.delete(path.into_inner()).await? {
        return Err(ApiError::ReviewNotFound);
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Review successfully deleted"
    })))
}
