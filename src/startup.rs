use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{AccessGuard, AuthManager, RevocationStore, TokenCodec};
use crate::catalog::{BookStore, ReviewStore};
use crate::configuration::Settings;
use crate::email_client::Mailer;
use crate::middleware::{BearerAuth, RequestLogger};
use crate::routes;
use crate::users::UserStore;

/// Wire the stores, mailer, and settings into a running server.
///
/// The auth manager and access guard are built here from the injected
/// collaborators; handlers receive them through `web::Data`.
pub fn run(
    listener: TcpListener,
    users: Arc<dyn UserStore>,
    books: Arc<dyn BookStore>,
    reviews: Arc<dyn ReviewStore>,
    revocations: Arc<dyn RevocationStore>,
    mailer: Arc<Mailer>,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let codec = TokenCodec::new(settings.jwt.clone());
    let manager = web::Data::new(AuthManager::new(
        users.clone(),
        revocations.clone(),
        codec.clone(),
        mailer,
    ));
    let guard = Arc::new(AccessGuard::new(codec, revocations));

    let guard_data = web::Data::from(guard.clone());
    let users_data: web::Data<dyn UserStore> = web::Data::from(users);
    let books_data: web::Data<dyn BookStore> = web::Data::from(books);
    let reviews_data: web::Data<dyn ReviewStore> = web::Data::from(reviews);
    let jwt_data = web::Data::new(settings.jwt.clone());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            .app_data(manager.clone())
            .app_data(guard_data.clone())
            .app_data(users_data.clone())
            .app_data(books_data.clone())
            .app_data(reviews_data.clone())
            .app_data(jwt_data.clone())
            .route("/health_check", web::get().to(routes::health_check))
            .service(
                web::scope("/api/v1/users")
                    .route("/signup", web::post().to(routes::signup))
                    .route("/verify", web::get().to(routes::verify_email))
                    .route("/login", web::post().to(routes::login))
                    .route("/refresh", web::post().to(routes::refresh))
                    .route("/logout", web::post().to(routes::logout))
                    .route(
                        "/password-reset-request",
                        web::post().to(routes::password_reset_request),
                    )
                    .route(
                        "/password-reset-confirm/{token}",
                        web::post().to(routes::password_reset_confirm),
                    )
                    .service(
                        web::scope("")
                            .wrap(BearerAuth::new(guard.clone()))
                            .route("/me", web::get().to(routes::me)),
                    ),
            )
            .service(
                web::scope("/api/v1/books")
                    .wrap(BearerAuth::new(guard.clone()))
                    .route("", web::get().to(routes::list_books))
                    .route("", web::post().to(routes::create_book))
                    .route("/{book_uid}", web::get().to(routes::get_book))
                    .route("/{book_uid}", web::patch().to(routes::update_book))
                    .route("/{book_uid}", web::delete().to(routes::delete_book)),
            )
            .service(
                web::scope("/api/v1/reviews")
                    .wrap(BearerAuth::new(guard.clone()))
                    .route("", web::get().to(routes::list_reviews))
                    .route("/book/{book_uid}", web::post().to(routes::add_review))
                    .route(
                        "/book/{book_uid}/{review_uid}",
                        web::patch().to(routes::update_review),
                    )
                    .route("/{review_uid}", web::get().to(routes::get_review))
                    .route("/{review_uid}", web::delete().to(routes::delete_review)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
