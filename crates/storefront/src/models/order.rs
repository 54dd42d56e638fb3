//! Orders and the records hanging off them.

use chrono::{DateTime, Utc};

use bookbazar_core::{
    AddressId, BookId, BookPricing, CouponId, CouponWindow, Money, OrderFlags, OrderId,
    OrderItemId, OrderStatus, PaymentId, PricedLine, RefundId, UserId,
};

/// The checkout and post-purchase record.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub ref_code: Option<String>,
    pub start_date: DateTime<Utc>,
    pub ordered_date: Option<DateTime<Utc>>,
    pub ordered: bool,
    pub shipping_address_id: Option<AddressId>,
    pub billing_address_id: Option<AddressId>,
    pub payment_id: Option<PaymentId>,
    pub coupon_id: Option<CouponId>,
    pub being_delivered: bool,
    pub received: bool,
    pub refund_requested: bool,
    pub refund_granted: bool,
}

impl Order {
    #[must_use]
    pub const fn flags(&self) -> OrderFlags {
        OrderFlags {
            ordered: self.ordered,
            being_delivered: self.being_delivered,
            received: self.received,
            refund_requested: self.refund_requested,
            refund_granted: self.refund_granted,
        }
    }

    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        OrderStatus::from_flags(self.flags())
    }
}

/// An order item with its price snapshot and book details.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderLine {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub book_id: BookId,
    pub slug: String,
    pub title: String,
    pub quantity: i32,
    pub unit_price: Money,
    pub unit_final_price: Money,
}

impl OrderLine {
    #[must_use]
    pub fn priced(&self) -> PricedLine {
        PricedLine::new(
            BookPricing::new(self.unit_price, Some(self.unit_final_price)),
            u32::try_from(self.quantity).unwrap_or(0),
        )
    }

    /// Savings on the whole line.
    #[must_use]
    pub fn amount_saved(&self) -> Money {
        self.priced().line_discount()
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    pub amount: Money,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub active: bool,
}

impl Coupon {
    #[must_use]
    pub const fn window(&self) -> CouponWindow {
        CouponWindow {
            active: self.active,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
        }
    }
}

/// A captured charge.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Payment {
    pub id: PaymentId,
    pub stripe_charge_id: String,
    pub user_id: Option<UserId>,
    pub user_email: Option<String>,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
}

/// A customer's refund request for an order.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Refund {
    pub id: RefundId,
    pub order_id: OrderId,
    pub order_ref_code: Option<String>,
    pub reason: String,
    pub accepted: bool,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
