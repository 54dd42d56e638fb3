//! Database tests for gallery images and inline book edits.
//!
//! Requires a migrated database:
//! - `STOREFRONT_DATABASE_URL` pointing at it

use bookbazar_core::{BookId, Money};
use bookbazar_integration_tests::pool;
use bookbazar_storefront::db::RepositoryError;
use bookbazar_storefront::db::book_images::{BookImageRepository, MAX_GALLERY_IMAGES};
use bookbazar_storefront::db::books::{BookRepository, BookRowUpdate};
use sqlx::PgPool;
use uuid::Uuid;

async fn create_book(pool: &PgPool, stock: i32) -> BookId {
    let slug = format!("catalog-test-{}", Uuid::new_v4().simple());
    sqlx::query_scalar::<_, BookId>(
        r"
        INSERT INTO storefront.book (title, slug, price, description, stock_quantity)
        VALUES ('Catalog Test Book', $1, 10.00, '', $2)
        RETURNING id
        ",
    )
    .bind(&slug)
    .bind(stock)
    .fetch_one(pool)
    .await
    .expect("Failed to create book")
}

fn paths(names: &[&str]) -> Vec<String> {
    names
        .iter()
        .map(|n| format!("/media/book_images/{n}.jpg"))
        .collect()
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_first_gallery_image_is_primary() {
    let pool = pool().await;
    let book = create_book(&pool, 1).await;
    let images = BookImageRepository::new(&pool);

    let added = images
        .add(book, &paths(&["front", "back"]), "Dust jacket")
        .await
        .expect("Failed to add images");
    assert!(added[0].is_primary);
    assert!(!added[1].is_primary);
    assert_eq!(added[1].caption, "Dust jacket");

    images
        .set_primary(book, added[1].id)
        .await
        .expect("Failed to change primary");
    let listed = images.list(book).await.expect("Failed to list images");
    assert_eq!(listed[0].id, added[1].id);
    assert_eq!(listed.iter().filter(|i| i.is_primary).count(), 1);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_deleting_primary_promotes_oldest() {
    let pool = pool().await;
    let book = create_book(&pool, 1).await;
    let images = BookImageRepository::new(&pool);
    let added = images
        .add(book, &paths(&["a", "b", "c"]), "")
        .await
        .expect("Failed to add images");

    let removed = images
        .delete(book, added[0].id)
        .await
        .expect("Failed to delete image");
    assert_eq!(removed, "/media/book_images/a.jpg");

    let listed = images.list(book).await.expect("Failed to list images");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, added[1].id);
    assert!(listed[0].is_primary);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_gallery_images_belong_to_their_book() {
    let pool = pool().await;
    let book = create_book(&pool, 1).await;
    let other = create_book(&pool, 1).await;
    let images = BookImageRepository::new(&pool);
    let added = images
        .add(book, &paths(&["mine"]), "")
        .await
        .expect("Failed to add image");

    assert!(matches!(
        images.delete(other, added[0].id).await,
        Err(RepositoryError::NotFound)
    ));
    assert!(matches!(
        images.set_primary(other, added[0].id).await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_gallery_is_capped() {
    let pool = pool().await;
    let book = create_book(&pool, 1).await;
    let images = BookImageRepository::new(&pool);
    let full: Vec<String> = (0..MAX_GALLERY_IMAGES)
        .map(|i| format!("/media/book_images/{i}.jpg"))
        .collect();
    images.add(book, &full, "").await.expect("Failed to fill gallery");

    assert!(matches!(
        images.add(book, &paths(&["one-more"]), "").await,
        Err(RepositoryError::Conflict(_))
    ));
    let listed = images.list(book).await.expect("Failed to list images");
    assert_eq!(listed.len(), full.len());
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_inline_rows_save_only_changes() {
    let pool = pool().await;
    let kept = create_book(&pool, 4).await;
    let changed = create_book(&pool, 4).await;
    let emptied = create_book(&pool, 4).await;

    let rows = [
        BookRowUpdate {
            id: kept,
            price: Money::from_cents(1000),
            stock_quantity: 4,
            featured: false,
            is_available: true,
        },
        BookRowUpdate {
            id: changed,
            price: Money::from_cents(1450),
            stock_quantity: 9,
            featured: true,
            is_available: true,
        },
        BookRowUpdate {
            id: emptied,
            price: Money::from_cents(1000),
            stock_quantity: 0,
            featured: false,
            is_available: true,
        },
    ];
    let n = BookRepository::new(&pool)
        .save_rows(&rows)
        .await
        .expect("Failed to save rows");
    assert_eq!(n, 2);

    let state = |id: BookId| {
        let pool = pool.clone();
        async move {
            sqlx::query_as::<_, (Money, i32, bool, bool)>(
                "SELECT price, stock_quantity, featured, is_available FROM storefront.book WHERE id = $1",
            )
            .bind(id)
            .fetch_one(&pool)
            .await
            .expect("Failed to read book")
        }
    };
    assert_eq!(state(changed).await, (Money::from_cents(1450), 9, true, true));
    assert_eq!(state(emptied).await, (Money::from_cents(1000), 0, false, false));
}
