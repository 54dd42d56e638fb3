//! Pure pricing math for books, cart lines, and orders.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::price::Money;

/// Sales tax shown on the cart page (8%).
///
/// Informational only; charges are made on the order total.
#[must_use]
pub const fn tax_rate() -> Decimal {
    Decimal::from_parts(8, 0, 0, false, 2)
}

/// Regular and discounted price of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPricing {
    pub price: Money,
    pub discount_price: Option<Money>,
}

impl BookPricing {
    #[must_use]
    pub const fn new(price: Money, discount_price: Option<Money>) -> Self {
        Self {
            price,
            discount_price,
        }
    }

    /// The discount price, when it undercuts the regular price.
    #[must_use]
    pub fn active_discount(&self) -> Option<Money> {
        self.discount_price.filter(|d| *d < self.price)
    }

    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.active_discount().is_some()
    }

    /// Price the customer pays for one copy.
    #[must_use]
    pub fn final_price(&self) -> Money {
        self.active_discount().unwrap_or(self.price)
    }

    /// Whole-percent discount, truncated. Zero when not on sale.
    #[must_use]
    pub fn discount_percentage(&self) -> u32 {
        let Some(discount) = self.active_discount() else {
            return 0;
        };
        if !self.price.is_positive() {
            return 0;
        }
        let pct = (self.price.amount() - discount.amount()) / self.price.amount()
            * Decimal::ONE_HUNDRED;
        pct.trunc().to_u32().unwrap_or(0)
    }

    /// Savings on one copy.
    #[must_use]
    pub fn unit_saving(&self) -> Money {
        self.active_discount()
            .map_or(Money::ZERO, |discount| self.price - discount)
    }
}

/// A priced line of a cart or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub pricing: BookPricing,
    pub quantity: u32,
}

impl PricedLine {
    #[must_use]
    pub const fn new(pricing: BookPricing, quantity: u32) -> Self {
        Self { pricing, quantity }
    }

    /// Regular price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.pricing.price.times(self.quantity)
    }

    /// Amount saved on the whole line.
    #[must_use]
    pub fn line_discount(&self) -> Money {
        self.pricing.unit_saving().times(self.quantity)
    }

    /// What the customer pays for the whole line.
    #[must_use]
    pub fn line_final(&self) -> Money {
        self.pricing.final_price().times(self.quantity)
    }
}

/// Summary figures shown on the cart page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub total_items: u32,
    pub subtotal: Money,
    pub total_discount: Money,
    pub final_total: Money,
    pub tax: Money,
    pub grand_total: Money,
}

impl CartTotals {
    #[must_use]
    pub fn from_lines(lines: &[PricedLine]) -> Self {
        let total_items = lines.iter().map(|l| l.quantity).sum();
        let subtotal: Money = lines.iter().map(PricedLine::line_total).sum();
        let total_discount: Money = lines.iter().map(PricedLine::line_discount).sum();
        let final_total = subtotal - total_discount;
        let tax = final_total.scale(tax_rate()).round_cents();
        Self {
            total_items,
            subtotal,
            total_discount,
            final_total,
            tax,
            grand_total: final_total + tax,
        }
    }
}

/// Amount to charge for an order: line finals minus the coupon, never below zero.
#[must_use]
pub fn order_total(lines: &[PricedLine], coupon_amount: Option<Money>) -> Money {
    let items: Money = lines.iter().map(PricedLine::line_final).sum();
    (items - coupon_amount.unwrap_or(Money::ZERO)).non_negative()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(price_cents: i64, discount_cents: Option<i64>) -> BookPricing {
        BookPricing::new(
            Money::from_cents(price_cents),
            discount_cents.map(Money::from_cents),
        )
    }

    #[test]
    fn test_sale_requires_lower_discount() {
        assert!(book(2000, Some(1500)).is_on_sale());
        assert!(!book(2000, Some(2000)).is_on_sale());
        assert!(!book(2000, Some(2500)).is_on_sale());
        assert!(!book(2000, None).is_on_sale());
        assert_eq!(book(2000, Some(2500)).final_price(), Money::from_cents(2000));
    }

    #[test]
    fn test_discount_percentage_truncates() {
        // 1/3 off => 33.33..% => 33
        assert_eq!(book(3000, Some(2000)).discount_percentage(), 33);
        assert_eq!(book(2000, Some(1500)).discount_percentage(), 25);
        assert_eq!(book(2000, None).discount_percentage(), 0);
    }

    #[test]
    fn test_line_math() {
        let line = PricedLine::new(book(1000, Some(800)), 3);
        assert_eq!(line.line_total(), Money::from_cents(3000));
        assert_eq!(line.line_discount(), Money::from_cents(600));
        assert_eq!(line.line_final(), Money::from_cents(2400));
    }

    #[test]
    fn test_cart_totals_with_tax() {
        let lines = [
            PricedLine::new(book(1000, Some(800)), 2),
            PricedLine::new(book(1299, None), 1),
        ];
        let totals = CartTotals::from_lines(&lines);
        assert_eq!(totals.total_items, 3);
        assert_eq!(totals.subtotal, Money::from_cents(3299));
        assert_eq!(totals.total_discount, Money::from_cents(400));
        assert_eq!(totals.final_total, Money::from_cents(2899));
        // 28.99 * 0.08 = 2.3192
        assert_eq!(totals.tax, Money::from_cents(232));
        assert_eq!(totals.grand_total, Money::from_cents(3131));
    }

    #[test]
    fn test_empty_cart_totals_are_zero() {
        assert_eq!(CartTotals::from_lines(&[]), CartTotals::default());
    }

    #[test]
    fn test_order_total_applies_coupon_and_floors() {
        let lines = [PricedLine::new(book(1500, None), 2)];
        assert_eq!(order_total(&lines, None), Money::from_cents(3000));
        assert_eq!(
            order_total(&lines, Some(Money::from_cents(500))),
            Money::from_cents(2500)
        );
        assert_eq!(order_total(&lines, Some(Money::from_cents(5000))), Money::ZERO);
    }
}
