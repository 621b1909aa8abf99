//! End-to-end tests for the role-gated book and review routes. Catalog
//! access requires a verified account, so the helper walks the full
//! signup -> verify -> login path before handing out a token.

use std::net::TcpListener;
use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use bookworm::auth::{InMemoryRevocationStore, TokenCodec, TokenType};
use bookworm::catalog::{InMemoryBookStore, InMemoryReviewStore};
use bookworm::configuration::{ApplicationSettings, JwtSettings, MailSettings, Settings};
use bookworm::email_client::Mailer;
use bookworm::startup::run;
use bookworm::users::InMemoryUserStore;

struct TestApp {
    address: String,
    jwt: JwtSettings,
}

fn test_jwt_settings() -> JwtSettings {
    JwtSettings {
        secret: "test-secret-key-at-least-32-characters-long".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 172800,
        verification_token_expiry: 86400,
        password_reset_token_expiry: 3600,
        issuer: "bookworm-test".to_string(),
    }
}

fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let settings = Settings {
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port,
        },
        jwt: test_jwt_settings(),
        mail: MailSettings {
            api_base_url: None,
            api_key: None,
            smtp_host: None,
            smtp_port: 587,
            smtp_starttls: true,
            smtp_username: None,
            smtp_password: None,
            from_address: "noreply@bookworm.dev".to_string(),
            from_name: "Bookworm".to_string(),
            send_timeout_seconds: 10,
            domain: "http://127.0.0.1:8000".to_string(),
        },
    };

    let mailer = Arc::new(Mailer::new(&settings.mail).expect("Failed to build mailer"));
    let jwt = settings.jwt.clone();
    let server = run(
        listener,
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemoryBookStore::new()),
        Arc::new(InMemoryReviewStore::new()),
        Arc::new(InMemoryRevocationStore::new()),
        mailer,
        settings,
    )
    .expect("Failed to create server");

    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        jwt,
    }
}

/// Sign up a fresh account; returns its id.
async fn signup(app: &TestApp, email: &str) -> Uuid {
    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/users/signup", app.address))
        .json(&json!({
            "email": email,
            "username": "reader1",
            "first_name": "Jane",
            "last_name": "Doe",
            "password": "reading is fun"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.expect("Failed to parse signup body");
    Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
}

/// Redeem a verification token for `user_id`, minted with the same
/// signing settings the spawned app uses.
async fn verify(app: &TestApp, user_id: Uuid, email: &str) {
    let token = TokenCodec::new(app.jwt.clone())
        .issue(
            user_id,
            email,
            "user",
            TokenType::Verification,
            chrono::Duration::hours(24),
        )
        .unwrap();

    let response = reqwest::Client::new()
        .get(format!(
            "{}/api/v1/users/verify?token={}",
            app.address,
            urlencoding::encode(&token)
        ))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
}

async fn login(app: &TestApp, email: &str) -> String {
    let body: Value = reqwest::Client::new()
        .post(format!("{}/api/v1/users/login", app.address))
        .json(&json!({ "email": email, "password": "reading is fun" }))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse login body");

    body["access_token"].as_str().unwrap().to_string()
}

/// Full path to a catalog-ready token: signup, verify, login.
async fn verified_access_token(app: &TestApp) -> String {
    let user_id = signup(app, "reader@x.com").await;
    verify(app, user_id, "reader@x.com").await;
    login(app, "reader@x.com").await
}

fn book_body() -> Value {
    json!({
        "title": "Parable of the Sower",
        "author": "Octavia Butler",
        "published_year": 1993,
        "genre": "Science Fiction",
        "page_count": 345
    })
}

async fn create_book(client: &reqwest::Client, app: &TestApp, token: &str) -> Value {
    let response = client
        .post(format!("{}/api/v1/books", app.address))
        .bearer_auth(token)
        .json(&book_body())
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.expect("Failed to parse book body")
}

#[tokio::test]
async fn catalog_routes_require_a_token() {
    let app = spawn_app();
    let client = reqwest::Client::new();

    for url in [
        format!("{}/api/v1/books", app.address),
        format!("{}/api/v1/reviews", app.address),
    ] {
        let response = client.get(&url).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 401, "url {}", url);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error_code"], "access_token_required");
    }
}

#[tokio::test]
async fn catalog_routes_require_a_verified_account() {
    let app = spawn_app();
    signup(&app, "reader@x.com").await;
    // Logged in, but the verification email was never redeemed
    let token = login(&app, "reader@x.com").await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/books", app.address))
        .bearer_auth(&token)
        .json(&book_body())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error_code"], "account_not_verified");
}

#[tokio::test]
async fn book_crud_round_trip() {
    let app = spawn_app();
    let token = verified_access_token(&app).await;
    let client = reqwest::Client::new();

    let book = create_book(&client, &app, &token).await;
    let book_uid = book["uid"].as_str().unwrap();
    assert_eq!(book["title"], "Parable of the Sower");

    let listed: Value = client
        .get(format!("{}/api/v1/books", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let patched: Value = client
        .patch(format!("{}/api/v1/books/{}", app.address, book_uid))
        .bearer_auth(&token)
        .json(&json!({ "title": "Parable of the Talents" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(patched["title"], "Parable of the Talents");
    assert_eq!(patched["author"], "Octavia Butler");

    let deleted = client
        .delete(format!("{}/api/v1/books/{}", app.address, book_uid))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 200);

    let gone = client
        .get(format!("{}/api/v1/books/{}", app.address, book_uid))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status().as_u16(), 404);
    let body: Value = gone.json().await.unwrap();
    assert_eq!(body["error_code"], "book_not_found");
}

#[tokio::test]
async fn reviews_attach_to_existing_books_only() {
    let app = spawn_app();
    let token = verified_access_token(&app).await;

    let missing = reqwest::Client::new()
        .post(format!(
            "{}/api/v1/reviews/book/{}",
            app.address,
            Uuid::new_v4()
        ))
        .bearer_auth(&token)
        .json(&json!({ "rating": 4, "review_text": "Gripping" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
    let body: Value = missing.json().await.unwrap();
    assert_eq!(body["error_code"], "book_not_found");
}

#[tokio::test]
async fn review_rating_is_bounded() {
    let app = spawn_app();
    let token = verified_access_token(&app).await;
    let client = reqwest::Client::new();

    let book = create_book(&client, &app, &token).await;
    let book_uid = book["uid"].as_str().unwrap();

    for rating in [0, 6] {
        let response = client
            .post(format!("{}/api/v1/reviews/book/{}", app.address, book_uid))
            .bearer_auth(&token)
            .json(&json!({ "rating": rating, "review_text": "Gripping" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400, "rating {}", rating);
    }
}

#[tokio::test]
async fn review_update_addresses_book_and_review_together() {
    let app = spawn_app();
    let token = verified_access_token(&app).await;
    let client = reqwest::Client::new();

    let book = create_book(&client, &app, &token).await;
    let book_uid = book["uid"].as_str().unwrap();

    let review: Value = client
        .post(format!("{}/api/v1/reviews/book/{}", app.address, book_uid))
        .bearer_auth(&token)
        .json(&json!({ "rating": 4, "review_text": "Gripping" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let review_uid = review["uid"].as_str().unwrap();

    // Wrong book uid: the review must not be found
    let wrong_book = client
        .patch(format!(
            "{}/api/v1/reviews/book/{}/{}",
            app.address,
            Uuid::new_v4(),
            review_uid
        ))
        .bearer_auth(&token)
        .json(&json!({ "rating": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_book.status().as_u16(), 404);
    let body: Value = wrong_book.json().await.unwrap();
    assert_eq!(body["error_code"], "review_not_found");

    // Correct pair updates
    let updated: Value = client
        .patch(format!(
            "{}/api/v1/reviews/book/{}/{}",
            app.address, book_uid, review_uid
        ))
        .bearer_auth(&token)
        .json(&json!({ "rating": 5 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["rating"], 5);
    assert_eq!(updated["review_text"], "Gripping");

    let deleted = client
        .delete(format!("{}/api/v1/reviews/{}", app.address, review_uid))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 200);

    let gone = client
        .get(format!("{}/api/v1/reviews/{}", app.address, review_uid))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status().as_u16(), 404);
}
