//! Integration tests for BookBazar.
//!
//! The tests drive a running storefront over HTTP with a cookie-keeping
//! client, the way a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! bb-cli migrate
//! bb-cli seed -f crates/cli/seed/catalog.yaml
//! cargo run -p bookbazar-storefront &
//! cargo test -p bookbazar-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_TEST_URL` - Server under test (default: `http://localhost:3000`)
//! - `STOREFRONT_DATABASE_URL` - Same database the server uses, for fixtures

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use sqlx::PgPool;
use uuid::Uuid;

/// In stock in the demo catalog.
pub const IN_STOCK_BOOK: &str = "a-wizard-of-earthsea";

/// Zero stock in the demo catalog.
pub const OUT_OF_STOCK_BOOK: &str = "dune";

/// Password for every account the tests register.
pub const PASSWORD: &str = "correct horse battery";

/// Base URL of the storefront under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Absolute URL for a path on the storefront.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url())
}

/// A client that keeps the session cookie and follows redirects.
///
/// Each client claims its own documentation-range address through
/// `x-real-ip`, so the per-IP login and checkout limiters see every test
/// as a separate visitor.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    let id = Uuid::new_v4().as_u128();
    let ip = format!("198.51.{}.{}", (id >> 8) & 0xff, id & 0xff);

    let mut headers = HeaderMap::new();
    headers.insert(
        "x-real-ip",
        HeaderValue::from_str(&ip).expect("generated address is a valid header"),
    );

    Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// An email address no other test run has used.
#[must_use]
pub fn unique_email() -> String {
    format!("reader-{}@example.com", Uuid::new_v4().simple())
}

/// A fresh coupon code (4 to 15 upper-case characters).
#[must_use]
pub fn unique_coupon_code() -> String {
    let id = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("T{}", id.get(..10).unwrap_or(&id))
}

/// Register a new customer; the client is signed in afterwards.
///
/// # Panics
///
/// Panics if the request fails.
pub async fn register(client: &Client) -> String {
    let email = unique_email();
    let resp = client
        .post(url("/users/register"))
        .form(&[
            ("email", email.as_str()),
            ("password1", PASSWORD),
            ("password2", PASSWORD),
        ])
        .send()
        .await
        .expect("Failed to register");
    assert!(resp.status().is_success(), "register: {}", resp.status());
    email
}

/// POST an empty form and return the page the redirect lands on.
///
/// # Panics
///
/// Panics if the request fails.
pub async fn post_empty(client: &Client, path: &str) -> Response {
    client
        .post(url(path))
        .form(&[("", ""); 0])
        .send()
        .await
        .expect("Failed to send request")
}

/// Body text of a response.
///
/// # Panics
///
/// Panics if the body cannot be read.
pub async fn text(resp: Response) -> String {
    resp.text().await.expect("Failed to read response")
}

/// Connect to the storefront database for test fixtures.
///
/// # Panics
///
/// Panics if no database URL is set or the connection fails.
pub async fn pool() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("STOREFRONT_DATABASE_URL or DATABASE_URL must be set");
    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database")
}
