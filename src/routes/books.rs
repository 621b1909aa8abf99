/// Book catalog routes. All of them sit behind the bearer middleware
/// and require a verified account; both roles may manage books.
use actix_web::{web, HttpResponse};
use lazy_static::lazy_static;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{AccessGuard, RoleSet, TokenClaims};
use crate::catalog::{BookStore, BookUpdate, NewBook};
use crate::error::{ApiError, ValidationError};
use crate::routes::authorize;
use crate::users::UserStore;

lazy_static! {
    static ref CATALOG_ROLES: RoleSet = RoleSet::new(["admin", "user"]);
}

#[derive(Deserialize)]
pub struct BookCreateRequest {
    pub title: String,
    pub author: String,
    pub published_year: i32,
    pub genre: String,
    pub page_count: i32,
}

/// GET /api/v1/books
pub async fn list_books(
    claims: web::ReqData<TokenClaims>,
    guard: web::Data<AccessGuard>,
    users: web::Data<dyn UserStore>,
    books: web::Data<dyn BookStore>,
) -> Result<HttpResponse, ApiError> {
    authorize(&claims, &guard, &users, &CATALOG_ROLES).await?;
    let all = books.list().await?;
    Ok(HttpResponse::Ok().json(all))
}

/// POST /api/v1/books
pub async fn create_book(
    claims: web::ReqData<TokenClaims>,
    guard: web::Data<AccessGuard>,
    users: web::Data<dyn UserStore>,
    books: web::Data<dyn BookStore>,
    form: web::Json<BookCreateRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = authorize(&claims, &guard, &users, &CATALOG_ROLES).await?;

    if form.title.trim().is_empty() {
        return Err(ValidationError::EmptyField("title").into());
    }
    if form.author.trim().is_empty() {
        return Err(ValidationError::EmptyField("author").into());
    }
    if form.page_count <= 0 {
        return Err(ValidationError::InvalidFormat("page_count").into());
    }

    let book = books
        .insert(NewBook {
            title: form.title.trim().to_string(),
            author: form.author.trim().to_string(),
            published_year: form.published_year,
            genre: form.genre.trim().to_string(),
            page_count: form.page_count,
            user_uid: user.id,
        })
        .await?;

    tracing::info!(book_uid = %book.uid, user_id = %user.id, "book created");
    Ok(HttpResponse::Created().json(book))
}

/// GET /api/v1/books/{book_uid}
pub async fn get_book(
    claims: web::ReqData<TokenClaims>,
    guard: web::Data<AccessGuard>,
    users: web::Data<dyn UserStore>,
    books: web::Data<dyn BookStore>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    authorize(&claims, &guard, &users, &CATALOG_ROLES).await?;
    let book = books
        .get(path.into_inner())
        .await?
        .ok_or(ApiError::BookNotFound)?;
    Ok(HttpResponse::Ok().json(book))
}

/// PATCH /api/v1/books/{book_uid}
pub async fn update_book(
    claims: web::ReqData<TokenClaims>,
    guard: web::Data<AccessGuard>,
    users: web::Data<dyn UserStore>,
    books: web::Data<dyn BookStore>,
    path: web::Path<Uuid>,
    form: web::Json<BookUpdate>,
) -> Result<HttpResponse, ApiError> {
    authorize(&claims, &guard, &users, &CATALOG_ROLES).await?;
    let book = books
        .update(path.into_inner(), form.into_inner())
        .await?
        .ok_or(ApiError::BookNotFound)?;
    Ok(HttpResponse::Ok().json(book))
}

/// DELETE /api/v1/books/{book_uid}
pub async fn delete_book(
    claims: web::ReqData<TokenClaims>,
    guard: web::Data<AccessGuard>,
    users: web::Data<dyn UserStore>,
    books: web::Data<dyn BookStore>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    authorize(&claims, &guard, &users, &CATALOG_ROLES).await?;
    if !books.delete(path.into_inner()).await? {
        return Err(ApiError::BookNotFound);
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Book successfully deleted"
    })))
}
