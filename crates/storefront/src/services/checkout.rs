//! Coupon redemption and the Stripe payment flow.
//!
//! The basket (`cart_item`) is copied into the open order whenever checkout
//! state is needed, so coupons and payments always see current prices.

use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use sqlx::PgPool;
use thiserror::Error;

use bookbazar_core::{
    CouponCodeError, CouponRejection, Email, Money, OrderId, REF_CODE_ALPHABET, REF_CODE_LEN,
    UserId, normalize_coupon_code, order_total,
};

use crate::db::RepositoryError;
use crate::db::coupons::CouponRepository;
use crate::db::orders::OrderRepository;
use crate::db::profiles::ProfileRepository;
use crate::db::{books, carts, orders, payments};
use crate::forms::checkout::PaymentInstruction;
use crate::models::{Coupon, FlashLevel, Order, OrderLine};
use crate::services::stripe::{ChargeSource, PaymentError, PaymentGateway, SavedCard};

/// Reasons a coupon or payment request cannot go ahead.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    InvalidCode(#[from] CouponCodeError),

    #[error("This coupon does not exist")]
    UnknownCoupon,

    #[error("This coupon has expired or is no longer active")]
    CouponUnavailable(CouponRejection),

    #[error("You do not have an active order")]
    NoActiveOrder,

    #[error("You have not added a billing address")]
    NoBillingAddress,

    #[error("Invalid data received")]
    InvalidPaymentData,

    #[error("Sorry, {0} no longer has enough stock.")]
    OutOfStock(String),

    #[error("payment failed: {0}")]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl CheckoutError {
    /// Flash shown to the shopper, or `None` for errors that become a 500.
    #[must_use]
    pub fn flash(&self) -> Option<(FlashLevel, String)> {
        match self {
            Self::Repository(_) => None,
            Self::Payment(err) => Some((FlashLevel::Warning, err.user_message())),
            Self::NoActiveOrder | Self::NoBillingAddress | Self::OutOfStock(_) => {
                Some((FlashLevel::Warning, self.to_string()))
            }
            _ => Some((FlashLevel::Info, self.to_string())),
        }
    }

    /// Where the shopper is sent after this error on the payment page.
    #[must_use]
    pub const fn payment_redirect(&self) -> &'static str {
        match self {
            Self::NoBillingAddress => "/checkout",
            Self::InvalidPaymentData => "/payment/stripe",
            Self::NoActiveOrder | Self::OutOfStock(_) => "/order-summary",
            _ => "/",
        }
    }
}

/// An open order with its lines and coupon, priced.
#[derive(Debug, Clone)]
pub struct OrderSnapshot {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub coupon: Option<Coupon>,
    pub total: Money,
}

/// A completed payment.
#[derive(Debug, Clone)]
pub struct PaidOrder {
    pub order_id: OrderId,
    pub ref_code: String,
    pub total: Money,
    pub lines: Vec<OrderLine>,
    /// Set when an expired coupon was detached before charging.
    pub dropped_coupon: Option<String>,
}

/// Coupon and checkout operations over the database.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Copy the cart into the open order and price it.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NoActiveOrder` when the cart is empty.
    pub async fn snapshot(&self, user: UserId) -> Result<OrderSnapshot, CheckoutError> {
        let orders = OrderRepository::new(self.pool);
        let order = orders
            .sync_open_order(user)
            .await?
            .ok_or(CheckoutError::NoActiveOrder)?;
        self.price(order).await
    }

    /// Price an order that has already been synced.
    async fn price(&self, order: Order) -> Result<OrderSnapshot, CheckoutError> {
        let lines = OrderRepository::new(self.pool).lines(order.id).await?;
        let coupon = match order.coupon_id {
            Some(id) => CouponRepository::new(self.pool).get(id).await?,
            None => None,
        };
        let priced: Vec<_> = lines.iter().map(OrderLine::priced).collect();
        let total = order_total(&priced, coupon.as_ref().map(|c| c.amount));
        Ok(OrderSnapshot {
            order,
            lines,
            coupon,
            total,
        })
    }

    /// Attach a coupon to the shopper's open order.
    ///
    /// # Errors
    ///
    /// Returns the matching `CheckoutError` for a malformed, unknown,
    /// inactive, or out-of-window code, or an empty cart.
    pub async fn apply_coupon(
        &self,
        user: UserId,
        raw_code: &str,
        now: DateTime<Utc>,
    ) -> Result<Coupon, CheckoutError> {
        let code = normalize_coupon_code(raw_code)?;
        let coupon = CouponRepository::new(self.pool)
            .get_by_code(&code)
            .await?
            .ok_or(CheckoutError::UnknownCoupon)?;
        coupon
            .window()
            .check(now)
            .map_err(CheckoutError::CouponUnavailable)?;

        let orders = OrderRepository::new(self.pool);
        let order = orders
            .sync_open_order(user)
            .await?
            .ok_or(CheckoutError::NoActiveOrder)?;
        orders.set_coupon(order.id, Some(coupon.id)).await?;

        tracing::info!(order_id = %order.id, coupon = %coupon.code, "Coupon applied");
        Ok(coupon)
    }

    /// Saved cards for one-click customers. Gateway failures hide the list.
    pub async fn saved_cards<G: PaymentGateway>(
        &self,
        gateway: &G,
        user: UserId,
    ) -> Result<Vec<SavedCard>, CheckoutError> {
        let profile = ProfileRepository::new(self.pool).get_or_create(user).await?;
        let Some(customer) = profile.one_click_customer() else {
            return Ok(Vec::new());
        };
        match gateway.list_cards(customer).await {
            Ok(cards) => Ok(cards),
            Err(err) => {
                tracing::warn!(error = %err, "Could not list saved cards");
                Ok(Vec::new())
            }
        }
    }

    /// Charge the open order and mark it paid.
    ///
    /// The order row is locked first, then stock is reserved, the charge
    /// taken, and the order marked paid inside one transaction. A failed
    /// charge rolls the reservation back.
    ///
    /// # Errors
    ///
    /// Returns a `CheckoutError` describing what the shopper must fix, or
    /// `CheckoutError::Repository` for database failures.
    pub async fn pay<G: PaymentGateway>(
        &self,
        gateway: &G,
        user: UserId,
        email: &Email,
        instruction: &PaymentInstruction,
        now: DateTime<Utc>,
    ) -> Result<PaidOrder, CheckoutError> {
        let orders = OrderRepository::new(self.pool);
        let mut order = orders
            .sync_open_order(user)
            .await?
            .ok_or(CheckoutError::NoActiveOrder)?;
        if order.billing_address_id.is_none() {
            return Err(CheckoutError::NoBillingAddress);
        }

        let mut dropped_coupon = None;
        if let Some(coupon_id) = order.coupon_id {
            let coupon = CouponRepository::new(self.pool).get(coupon_id).await?;
            let usable = coupon.as_ref().is_some_and(|c| c.window().is_valid_at(now));
            if !usable {
                orders.set_coupon(order.id, None).await?;
                order.coupon_id = None;
                dropped_coupon = coupon.map(|c| c.code);
                tracing::info!(order_id = %order.id, "Expired coupon detached before payment");
            }
        }

        let order_id = order.id;
        let coupon_amount = match order.coupon_id {
            Some(id) => CouponRepository::new(self.pool).get(id).await?.map(|c| c.amount),
            None => None,
        };

        let profiles = ProfileRepository::new(self.pool);
        let profile = profiles.get_or_create(user).await?;
        let prepared = prepare_source(
            gateway,
            instruction,
            profile.stripe_customer_id.as_deref(),
            email,
        )
        .await?;
        if let Some(customer) = prepared.new_customer() {
            profiles.set_stripe_customer(user, customer).await?;
        }

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        // A second submit of the same order waits here and then finds it paid.
        if !orders::lock_unpaid(&mut *tx, order_id).await? {
            return Err(CheckoutError::NoActiveOrder);
        }

        let lines = orders::order_lines(&mut *tx, order_id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::NoActiveOrder);
        }
        let priced: Vec<_> = lines.iter().map(OrderLine::priced).collect();
        let total = order_total(&priced, coupon_amount);
        let amount_cents = total
            .to_cents()
            .ok_or_else(|| PaymentError::Unexpected(format!("amount {total} out of range")))?;

        for line in &lines {
            if !books::reserve_stock(&mut *tx, line.book_id, line.quantity).await? {
                return Err(CheckoutError::OutOfStock(line.title.clone()));
            }
        }

        let charge = gateway.charge(amount_cents, prepared.source()).await?;

        let ref_code = generate_ref_code();
        let payment_id = payments::insert(&mut *tx, &charge.id, user, total).await?;
        orders::mark_ordered(&mut *tx, order_id, payment_id, &ref_code).await?;
        carts::clear(&mut *tx, user).await?;

        if let Err(err) = tx.commit().await {
            tracing::error!(
                charge_id = %charge.id,
                order_id = %order_id,
                error = %err,
                "Charge captured but order commit failed"
            );
            return Err(RepositoryError::from(err).into());
        }

        tracing::info!(
            order_id = %order_id,
            ref_code = %ref_code,
            amount = %total,
            "Order paid"
        );

        Ok(PaidOrder {
            order_id,
            ref_code,
            total,
            lines,
            dropped_coupon,
        })
    }
}

/// Card to charge once the save-card step is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreparedSource {
    /// A one-time token.
    Token(String),
    /// A customer's default card. `is_new` customers must be stored on the profile.
    Customer { id: String, is_new: bool },
}

impl PreparedSource {
    #[must_use]
    pub fn source(&self) -> ChargeSource<'_> {
        match self {
            Self::Token(token) => ChargeSource::Token(token),
            Self::Customer { id, .. } => ChargeSource::Customer(id),
        }
    }

    /// A customer created for this payment.
    #[must_use]
    pub fn new_customer(&self) -> Option<&str> {
        match self {
            Self::Customer { id, is_new: true } => Some(id),
            _ => None,
        }
    }
}

/// Decide what to charge, saving the card on a customer first if asked.
///
/// # Errors
///
/// Returns `CheckoutError::InvalidPaymentData` when there is nothing to
/// charge, or the gateway error from creating the customer or source.
pub async fn prepare_source<G: PaymentGateway>(
    gateway: &G,
    instruction: &PaymentInstruction,
    existing_customer: Option<&str>,
    email: &Email,
) -> Result<PreparedSource, CheckoutError> {
    let token = instruction.token.as_deref();

    if instruction.save
        && let Some(token) = token
    {
        if let Some(customer) = existing_customer {
            gateway.attach_source(customer, token).await?;
            return Ok(PreparedSource::Customer {
                id: customer.to_owned(),
                is_new: false,
            });
        }
        let customer = gateway.create_customer(email).await?;
        gateway.attach_source(&customer, token).await?;
        return Ok(PreparedSource::Customer {
            id: customer,
            is_new: true,
        });
    }

    if instruction.use_default {
        let customer = existing_customer.ok_or(CheckoutError::InvalidPaymentData)?;
        return Ok(PreparedSource::Customer {
            id: customer.to_owned(),
            is_new: false,
        });
    }

    token
        .map(|t| PreparedSource::Token(t.to_owned()))
        .ok_or(CheckoutError::InvalidPaymentData)
}

/// A fresh order reference code.
#[must_use]
pub fn generate_ref_code() -> String {
    let mut rng = rand::rng();
    (0..REF_CODE_LEN)
        .filter_map(|_| REF_CODE_ALPHABET.choose(&mut rng).copied().map(char::from))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use bookbazar_core::is_valid_ref_code;

    use super::*;
    use crate::services::stripe::Charge;

    #[derive(Default)]
    struct FakeGateway {
        calls: Mutex<Vec<String>>,
        decline: bool,
    }

    impl FakeGateway {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl PaymentGateway for FakeGateway {
        async fn create_customer(&self, email: &Email) -> Result<String, PaymentError> {
            self.record(format!("create_customer {email}"));
            Ok("cus_new".to_string())
        }

        async fn attach_source(&self, customer_id: &str, token: &str) -> Result<(), PaymentError> {
            self.record(format!("attach {customer_id} {token}"));
            if self.decline {
                return Err(PaymentError::Card("Your card was declined.".to_string()));
            }
            Ok(())
        }

        async fn list_cards(&self, _customer_id: &str) -> Result<Vec<SavedCard>, PaymentError> {
            Ok(Vec::new())
        }

        async fn charge(
            &self,
            amount_cents: i64,
            source: ChargeSource<'_>,
        ) -> Result<Charge, PaymentError> {
            self.record(format!("charge {amount_cents} {source:?}"));
            Ok(Charge {
                id: "ch_1".to_string(),
                amount: amount_cents,
            })
        }
    }

    fn instruction(token: Option<&str>, save: bool, use_default: bool) -> PaymentInstruction {
        PaymentInstruction {
            token: token.map(str::to_owned),
            save,
            use_default,
        }
    }

    fn email() -> Email {
        Email::parse("reader@example.org").unwrap()
    }

    #[test]
    fn test_ref_code_shape() {
        let code = generate_ref_code();
        assert!(is_valid_ref_code(&code), "{code}");
        assert_ne!(code, generate_ref_code());
    }

    #[tokio::test]
    async fn test_one_time_token_is_charged_directly() {
        let gateway = FakeGateway::default();
        let prepared = prepare_source(&gateway, &instruction(Some("tok_visa"), false, false), None, &email())
            .await
            .unwrap();
        assert_eq!(prepared.source(), ChargeSource::Token("tok_visa"));
        assert!(prepared.new_customer().is_none());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_save_without_customer_creates_one() {
        let gateway = FakeGateway::default();
        let prepared = prepare_source(&gateway, &instruction(Some("tok_visa"), true, false), None, &email())
            .await
            .unwrap();
        assert_eq!(prepared.source(), ChargeSource::Customer("cus_new"));
        assert_eq!(prepared.new_customer(), Some("cus_new"));
        assert_eq!(
            gateway.calls(),
            vec!["create_customer reader@example.org", "attach cus_new tok_visa"]
        );
    }

    #[tokio::test]
    async fn test_save_with_customer_attaches_new_card() {
        let gateway = FakeGateway::default();
        let prepared = prepare_source(
            &gateway,
            &instruction(Some("tok_mc"), true, false),
            Some("cus_old"),
            &email(),
        )
        .await
        .unwrap();
        assert_eq!(prepared.source(), ChargeSource::Customer("cus_old"));
        assert!(prepared.new_customer().is_none());
        assert_eq!(gateway.calls(), vec!["attach cus_old tok_mc"]);
    }

    #[tokio::test]
    async fn test_use_default_requires_saved_customer() {
        let gateway = FakeGateway::default();
        let err = prepare_source(&gateway, &instruction(None, false, true), None, &email())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidPaymentData));
        assert_eq!(err.payment_redirect(), "/payment/stripe");

        let prepared = prepare_source(&gateway, &instruction(None, false, true), Some("cus_9"), &email())
            .await
            .unwrap();
        assert_eq!(prepared.source(), ChargeSource::Customer("cus_9"));
    }

    #[tokio::test]
    async fn test_declined_card_surfaces_gateway_message() {
        let gateway = FakeGateway {
            decline: true,
            ..FakeGateway::default()
        };
        let err = prepare_source(
            &gateway,
            &instruction(Some("tok_chargeDeclined"), true, false),
            Some("cus_old"),
            &email(),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.flash(),
            Some((FlashLevel::Warning, "Your card was declined.".to_string()))
        );
        assert_eq!(err.payment_redirect(), "/");
    }

    #[test]
    fn test_flash_texts() {
        assert_eq!(
            CheckoutError::OutOfStock("Dune".into()).flash().unwrap().1,
            "Sorry, Dune no longer has enough stock."
        );
        assert_eq!(
            CheckoutError::CouponUnavailable(CouponRejection::Expired).to_string(),
            "This coupon has expired or is no longer active"
        );
        assert_eq!(CheckoutError::NoBillingAddress.payment_redirect(), "/checkout");
        assert!(CheckoutError::Repository(RepositoryError::NotFound).flash().is_none());
    }
}
