//! Cart line type.

use chrono::{DateTime, Utc};

use bookbazar_core::{BookId, BookPricing, CartItemId, Money, PricedLine};

/// A cart item joined with the book it holds.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartLine {
    pub id: CartItemId,
    pub book_id: BookId,
    pub slug: String,
    pub title: String,
    pub author_name: Option<String>,
    pub cover_image: Option<String>,
    pub price: Money,
    pub discount_price: Option<Money>,
    pub quantity: i32,
    pub stock_quantity: i32,
    pub is_available: bool,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    #[must_use]
    pub const fn pricing(&self) -> BookPricing {
        BookPricing::new(self.price, self.discount_price)
    }

    #[must_use]
    pub fn priced(&self) -> PricedLine {
        PricedLine::new(self.pricing(), u32::try_from(self.quantity).unwrap_or(0))
    }
}
