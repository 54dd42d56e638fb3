//! Integration tests for registration, login, and access control.
//!
//! These tests require:
//! - A migrated database
//! - The storefront server running (cargo run -p bookbazar-storefront)

use bookbazar_integration_tests::{PASSWORD, client, post_empty, register, text, url};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_register_signs_in() {
    let client = client();
    let email = register(&client).await;

    let resp = client
        .get(url("/users/profile"))
        .send()
        .await
        .expect("Failed to get profile");
    assert_eq!(resp.url().path(), "/users/profile");
    assert!(text(resp).await.contains(&email));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_duplicate_registration() {
    let first = client();
    let email = register(&first).await;

    let resp = client()
        .post(url("/users/register"))
        .form(&[
            ("email", email.as_str()),
            ("password1", PASSWORD),
            ("password2", PASSWORD),
        ])
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(text(resp).await.contains("A user with this email already exists."));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_logout_then_login() {
    let client = client();
    let email = register(&client).await;

    let resp = post_empty(&client, "/users/logout").await;
    assert!(resp.status().is_success());

    let resp = client
        .post(url("/users/login"))
        .form(&[("email", email.as_str()), ("password", "wrong password")])
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.url().path(), "/users/login");

    let resp = client
        .post(url("/users/login"))
        .form(&[("email", email.as_str()), ("password", PASSWORD)])
        .send()
        .await
        .expect("Failed to log in");
    assert_ne!(resp.url().path(), "/users/login");
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_back_office_is_staff_only() {
    let client = client();
    register(&client).await;

    let resp = client
        .get(url("/admin"))
        .send()
        .await
        .expect("Failed to get admin");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .get(url("/add-product"))
        .send()
        .await
        .expect("Failed to get add-product");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_other_users_orders_are_not_found() {
    let client = client();
    register(&client).await;

    let resp = client
        .get(url("/account/orders/aaaaaaaaaaaaaaaaaaaa"))
        .send()
        .await
        .expect("Failed to get order");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
