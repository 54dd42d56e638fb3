//! Integration tests for catalog browsing and search.
//!
//! These tests require:
//! - A migrated database seeded with `crates/cli/seed/catalog.yaml`
//! - The storefront server running (cargo run -p bookbazar-storefront)

use bookbazar_integration_tests::{IN_STOCK_BOOK, client, text, url};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_health() {
    let resp = client()
        .get(url("/health"))
        .send()
        .await
        .expect("Failed to get health");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_home_lists_books() {
    let resp = client().get(url("/")).send().await.expect("Failed to get home");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = text(resp).await;
    assert!(body.contains("A Wizard of Earthsea"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_product_detail_and_missing_book() {
    let client = client();

    let resp = client
        .get(url(&format!("/product/{IN_STOCK_BOOK}")))
        .send()
        .await
        .expect("Failed to get product");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(text(resp).await.contains("Ursula K. Le Guin"));

    let resp = client
        .get(url("/product/no-such-book"))
        .send()
        .await
        .expect("Failed to get missing product");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_quick_search_matches_author() {
    let resp = client()
        .get(url("/search?q=herbert"))
        .send()
        .await
        .expect("Failed to search");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = text(resp).await;
    assert!(body.contains("Dune"));
    assert!(!body.contains("SPQR"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_category_page_includes_subcategory_books() {
    let resp = client()
        .get(url("/categories/fiction"))
        .send()
        .await
        .expect("Failed to get category");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = text(resp).await;
    assert!(body.contains("Fantasy"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_security_headers() {
    let resp = client().get(url("/")).send().await.expect("Failed to get home");
    let headers = resp.headers();
    assert_eq!(
        headers.get("x-content-type-options").map(|v| v.as_bytes()),
        Some(&b"nosniff"[..])
    );
    assert!(headers.contains_key("content-security-policy"));
    assert!(headers.contains_key("x-request-id"));
}
