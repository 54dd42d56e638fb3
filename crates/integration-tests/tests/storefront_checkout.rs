//! Integration tests for the cart, coupons, and checkout.
//!
//! These tests require:
//! - A migrated database seeded with `crates/cli/seed/catalog.yaml`
//! - The storefront server running (cargo run -p bookbazar-storefront)
//! - `STOREFRONT_DATABASE_URL` pointing at the same database
//!
//! No test here reaches the payment gateway.

use bookbazar_integration_tests::{
    IN_STOCK_BOOK, OUT_OF_STOCK_BOOK, client, pool, post_empty, register, text,
    unique_coupon_code, url,
};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_cart_requires_login() {
    let resp = client()
        .get(url("/order-summary"))
        .send()
        .await
        .expect("Failed to get cart");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.url().path().starts_with("/users/login"));
    assert!(text(resp).await.contains("Please login to view your cart."));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_add_remove_cart() {
    let client = client();
    register(&client).await;

    let resp = post_empty(&client, &format!("/add-to-cart/{IN_STOCK_BOOK}")).await;
    assert!(text(resp).await.contains("added to your cart!"));

    let resp = client
        .get(url("/cart/count"))
        .send()
        .await
        .expect("Failed to get cart count");
    assert!(text(resp).await.contains('1'));

    let resp = post_empty(&client, &format!("/add-to-cart/{IN_STOCK_BOOK}")).await;
    assert!(text(resp).await.contains("quantity updated in your cart!"));

    let resp = post_empty(&client, &format!("/remove-single-item-from-cart/{IN_STOCK_BOOK}")).await;
    assert_eq!(resp.url().path(), "/order-summary");

    let resp = post_empty(&client, &format!("/remove-from-cart/{IN_STOCK_BOOK}")).await;
    assert!(text(resp).await.contains("Book was removed from your cart."));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_out_of_stock_book_cannot_be_added() {
    let client = client();
    register(&client).await;

    let resp = post_empty(&client, &format!("/add-to-cart/{OUT_OF_STOCK_BOOK}")).await;
    assert_eq!(resp.url().path(), "/");
    assert!(text(resp).await.contains("Sorry, Dune is out of stock."));

    let resp = client
        .get(url("/order-summary"))
        .send()
        .await
        .expect("Failed to get cart");
    assert!(!text(resp).await.contains("Dune"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_expired_coupon_is_rejected() {
    let code = unique_coupon_code();
    sqlx::query(
        "INSERT INTO storefront.coupon (code, amount, valid_from, valid_to)
         VALUES ($1, 5, NOW() - INTERVAL '10 days', NOW() - INTERVAL '1 day')",
    )
    .bind(&code)
    .execute(&pool().await)
    .await
    .expect("Failed to insert coupon");

    let client = client();
    register(&client).await;
    post_empty(&client, &format!("/add-to-cart/{IN_STOCK_BOOK}")).await;

    let resp = client
        .post(url("/add-coupon"))
        .form(&[("code", code.as_str())])
        .send()
        .await
        .expect("Failed to apply coupon");
    let body = text(resp).await;
    assert!(body.contains("This coupon has expired or is no longer active"));
    assert!(!body.contains("Coupon applied successfully!"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_unknown_coupon_is_rejected() {
    let client = client();
    register(&client).await;
    post_empty(&client, &format!("/add-to-cart/{IN_STOCK_BOOK}")).await;

    let resp = client
        .post(url("/add-coupon"))
        .form(&[("code", unique_coupon_code().as_str())])
        .send()
        .await
        .expect("Failed to apply coupon");
    assert!(text(resp).await.contains("This coupon does not exist"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_payment_page_requires_billing_address() {
    let client = client();
    register(&client).await;
    post_empty(&client, &format!("/add-to-cart/{IN_STOCK_BOOK}")).await;

    let resp = client
        .get(url("/payment/stripe"))
        .send()
        .await
        .expect("Failed to get payment page");
    assert_eq!(resp.url().path(), "/checkout");
    assert!(text(resp).await.contains("You have not added a billing address"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_checkout_missing_fields_rerenders_form() {
    let client = client();
    register(&client).await;
    post_empty(&client, &format!("/add-to-cart/{IN_STOCK_BOOK}")).await;

    let resp = client
        .post(url("/checkout"))
        .form(&[("payment_option", "S")])
        .send()
        .await
        .expect("Failed to post checkout");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = text(resp).await;
    assert!(body.contains("Please correct the errors below."));
    assert!(body.contains("This field is required"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_checkout_with_addresses_goes_to_payment() {
    let client = client();
    register(&client).await;
    post_empty(&client, &format!("/add-to-cart/{IN_STOCK_BOOK}")).await;

    let resp = client
        .post(url("/checkout"))
        .form(&[
            ("shipping_address", "1 Library Lane"),
            ("shipping_country", "US"),
            ("shipping_zip_code", "12345"),
            ("same_billing_address", "on"),
            ("payment_option", "S"),
        ])
        .send()
        .await
        .expect("Failed to post checkout");
    assert_eq!(resp.url().path(), "/payment/stripe");
    assert_eq!(resp.status(), StatusCode::OK);
}
