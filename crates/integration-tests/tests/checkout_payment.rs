//! Database tests for the payment transaction.
//!
//! These call `CheckoutService::pay` directly with an in-memory gateway, so
//! only a migrated database is needed:
//! - `STOREFRONT_DATABASE_URL` pointing at it
//!
//! Each test creates its own user and book.

use std::sync::Mutex;
use std::time::Duration;

use bookbazar_core::{AddressType, BookId, Email, Money, UserId, is_valid_ref_code};
use bookbazar_integration_tests::{pool, unique_coupon_code, unique_email};
use bookbazar_storefront::db::addresses::AddressRepository;
use bookbazar_storefront::db::carts::CartRepository;
use bookbazar_storefront::db::orders::OrderRepository;
use bookbazar_storefront::db::users::UserRepository;
use bookbazar_storefront::forms::checkout::PaymentInstruction;
use bookbazar_storefront::models::NewAddress;
use bookbazar_storefront::services::checkout::{CheckoutError, CheckoutService};
use bookbazar_storefront::services::stripe::{
    Charge, ChargeSource, PaymentError, PaymentGateway, SavedCard,
};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

/// Gateway that records captured amounts instead of calling Stripe.
#[derive(Default)]
struct RecordingGateway {
    captured: Mutex<Vec<i64>>,
    decline: bool,
    delay: Option<Duration>,
}

impl RecordingGateway {
    fn captured(&self) -> Vec<i64> {
        self.captured.lock().expect("gateway lock").clone()
    }
}

impl PaymentGateway for RecordingGateway {
    async fn create_customer(&self, _email: &Email) -> Result<String, PaymentError> {
        Ok("cus_test".to_string())
    }

    async fn attach_source(&self, _customer_id: &str, _token: &str) -> Result<(), PaymentError> {
        Ok(())
    }

    async fn list_cards(&self, _customer_id: &str) -> Result<Vec<SavedCard>, PaymentError> {
        Ok(Vec::new())
    }

    async fn charge(
        &self,
        amount_cents: i64,
        _source: ChargeSource<'_>,
    ) -> Result<Charge, PaymentError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.decline {
            return Err(PaymentError::Card("Your card was declined.".to_string()));
        }
        let mut captured = self.captured.lock().expect("gateway lock");
        captured.push(amount_cents);
        Ok(Charge {
            id: format!("ch_test_{}", captured.len()),
            amount: amount_cents,
        })
    }
}

/// A shopper with a billing address on their open order and `copies` of a
/// $10.00 book in the cart.
struct Shopper {
    user: UserId,
    email: Email,
    book: BookId,
}

async fn create_book(pool: &PgPool, stock: i32) -> BookId {
    let slug = format!("payment-test-{}", Uuid::new_v4().simple());
    sqlx::query_scalar::<_, BookId>(
        r"
        INSERT INTO storefront.book (title, slug, price, description, stock_quantity)
        VALUES ('Payment Test Book', $1, 10.00, '', $2)
        RETURNING id
        ",
    )
    .bind(&slug)
    .bind(stock)
    .fetch_one(pool)
    .await
    .expect("Failed to create book")
}

async fn shopper(pool: &PgPool, stock: i32, copies: i32) -> Shopper {
    let email = Email::parse(&unique_email()).expect("valid email");
    let user = UserRepository::new(pool)
        .create_with_password(&email, "not-a-real-hash", false)
        .await
        .expect("Failed to create user");
    let book = create_book(pool, stock).await;

    let carts = CartRepository::new(pool);
    for _ in 0..copies {
        carts.add(user.id, book, stock).await.expect("Failed to add to cart");
    }

    let address = AddressRepository::new(pool)
        .create(
            user.id,
            &NewAddress {
                street_address: "1 Library Lane".to_string(),
                apartment_address: String::new(),
                country: "US".to_string(),
                zip_code: "12345".to_string(),
                address_type: AddressType::Billing,
                is_default: false,
            },
        )
        .await
        .expect("Failed to create address");

    let orders = OrderRepository::new(pool);
    let order = orders
        .sync_open_order(user.id)
        .await
        .expect("Failed to sync order")
        .expect("cart is not empty");
    orders
        .set_addresses(order.id, address.id, address.id)
        .await
        .expect("Failed to set addresses");

    Shopper {
        user: user.id,
        email,
        book,
    }
}

fn card() -> PaymentInstruction {
    PaymentInstruction {
        token: Some("tok_visa".to_string()),
        save: false,
        use_default: false,
    }
}

async fn stock(pool: &PgPool, book: BookId) -> i32 {
    sqlx::query_scalar("SELECT stock_quantity FROM storefront.book WHERE id = $1")
        .bind(book)
        .fetch_one(pool)
        .await
        .expect("Failed to read stock")
}

async fn payment_rows(pool: &PgPool, user: UserId) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM storefront.payment WHERE user_id = $1")
        .bind(user)
        .fetch_one(pool)
        .await
        .expect("Failed to count payments")
}

async fn cart_lines(pool: &PgPool, user: UserId) -> i64 {
    CartRepository::new(pool)
        .line_count(user)
        .await
        .expect("Failed to count cart lines")
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_payment_marks_order_paid() {
    let pool = pool().await;
    let shopper = shopper(&pool, 5, 2).await;
    let gateway = RecordingGateway::default();

    let paid = CheckoutService::new(&pool)
        .pay(&gateway, shopper.user, &shopper.email, &card(), Utc::now())
        .await
        .expect("payment should succeed");

    assert_eq!(paid.total, Money::from_cents(2000));
    assert!(is_valid_ref_code(&paid.ref_code), "{}", paid.ref_code);
    assert!(paid.dropped_coupon.is_none());
    assert_eq!(gateway.captured(), vec![2000]);

    assert_eq!(stock(&pool, shopper.book).await, 3);
    assert_eq!(payment_rows(&pool, shopper.user).await, 1);
    assert_eq!(cart_lines(&pool, shopper.user).await, 0);

    let (ordered, ref_code): (bool, Option<String>) =
        sqlx::query_as("SELECT ordered, ref_code FROM storefront.order WHERE id = $1")
            .bind(paid.order_id)
            .fetch_one(&pool)
            .await
            .expect("Failed to read order");
    assert!(ordered);
    assert_eq!(ref_code.as_deref(), Some(paid.ref_code.as_str()));

    let open_items: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM storefront.order_item WHERE order_id = $1 AND NOT ordered",
    )
    .bind(paid.order_id)
    .fetch_one(&pool)
    .await
    .expect("Failed to count items");
    assert_eq!(open_items, 0);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_declined_charge_releases_stock() {
    let pool = pool().await;
    let shopper = shopper(&pool, 5, 1).await;
    let gateway = RecordingGateway {
        decline: true,
        ..RecordingGateway::default()
    };

    let err = CheckoutService::new(&pool)
        .pay(&gateway, shopper.user, &shopper.email, &card(), Utc::now())
        .await
        .expect_err("declined card should fail");

    assert!(matches!(err, CheckoutError::Payment(PaymentError::Card(_))), "{err}");
    assert_eq!(stock(&pool, shopper.book).await, 5);
    assert_eq!(payment_rows(&pool, shopper.user).await, 0);
    assert_eq!(cart_lines(&pool, shopper.user).await, 1);

    let open = OrderRepository::new(&pool)
        .open_order(shopper.user)
        .await
        .expect("Failed to read order");
    assert!(open.is_some_and(|order| !order.ordered));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_stock_sold_elsewhere_stops_payment() {
    let pool = pool().await;
    let shopper = shopper(&pool, 2, 2).await;
    sqlx::query("UPDATE storefront.book SET stock_quantity = 1 WHERE id = $1")
        .bind(shopper.book)
        .execute(&pool)
        .await
        .expect("Failed to lower stock");
    let gateway = RecordingGateway::default();

    let err = CheckoutService::new(&pool)
        .pay(&gateway, shopper.user, &shopper.email, &card(), Utc::now())
        .await
        .expect_err("short stock should fail");

    assert!(matches!(err, CheckoutError::OutOfStock(_)), "{err}");
    assert!(gateway.captured().is_empty());
    assert_eq!(stock(&pool, shopper.book).await, 1);
    assert_eq!(payment_rows(&pool, shopper.user).await, 0);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_unavailable_book_is_not_sold() {
    let pool = pool().await;
    let shopper = shopper(&pool, 5, 1).await;
    sqlx::query("UPDATE storefront.book SET is_available = FALSE WHERE id = $1")
        .bind(shopper.book)
        .execute(&pool)
        .await
        .expect("Failed to withdraw book");
    let gateway = RecordingGateway::default();

    let err = CheckoutService::new(&pool)
        .pay(&gateway, shopper.user, &shopper.email, &card(), Utc::now())
        .await
        .expect_err("withdrawn book should fail");

    assert!(matches!(err, CheckoutError::OutOfStock(_)), "{err}");
    assert!(gateway.captured().is_empty());
    assert_eq!(stock(&pool, shopper.book).await, 5);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_expired_coupon_is_detached_before_charging() {
    let pool = pool().await;
    let shopper = shopper(&pool, 5, 1).await;
    let code = unique_coupon_code();
    let coupon_id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO storefront.coupon (code, amount, valid_from, valid_to)
        VALUES ($1, 3.00, NOW() - INTERVAL '10 days', NOW() - INTERVAL '1 day')
        RETURNING id
        ",
    )
    .bind(&code)
    .fetch_one(&pool)
    .await
    .expect("Failed to create coupon");
    sqlx::query("UPDATE storefront.order SET coupon_id = $2 WHERE user_id = $1 AND NOT ordered")
        .bind(shopper.user)
        .bind(coupon_id)
        .execute(&pool)
        .await
        .expect("Failed to attach coupon");
    let gateway = RecordingGateway::default();

    let paid = CheckoutService::new(&pool)
        .pay(&gateway, shopper.user, &shopper.email, &card(), Utc::now())
        .await
        .expect("payment should succeed without the coupon");

    assert_eq!(paid.dropped_coupon.as_deref(), Some(code.as_str()));
    assert_eq!(paid.total, Money::from_cents(1000));
    assert_eq!(gateway.captured(), vec![1000]);

    let coupon: Option<i32> =
        sqlx::query_scalar("SELECT coupon_id FROM storefront.order WHERE id = $1")
            .bind(paid.order_id)
            .fetch_one(&pool)
            .await
            .expect("Failed to read order");
    assert!(coupon.is_none());
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_double_submit_charges_once() {
    let pool = pool().await;
    let shopper = shopper(&pool, 5, 1).await;
    let gateway = RecordingGateway {
        delay: Some(Duration::from_millis(300)),
        ..RecordingGateway::default()
    };
    let service = CheckoutService::new(&pool);
    let instruction = card();

    let (first, second) = tokio::join!(
        service.pay(&gateway, shopper.user, &shopper.email, &instruction, Utc::now()),
        service.pay(&gateway, shopper.user, &shopper.email, &instruction, Utc::now()),
    );

    let outcomes = [&first, &second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(CheckoutError::NoActiveOrder))),
        "first: {:?}, second: {:?}",
        first.as_ref().map(|p| &p.ref_code),
        second.as_ref().map(|p| &p.ref_code),
    );

    assert_eq!(gateway.captured().len(), 1);
    assert_eq!(payment_rows(&pool, shopper.user).await, 1);
    assert_eq!(stock(&pool, shopper.book).await, 4);
}
