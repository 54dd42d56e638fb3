//! Back-office forms.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde::de::value::{Error as ValueError, StrDeserializer};

use bookbazar_core::{BookId, Money, normalize_coupon_code};

use super::{FieldErrors, REQUIRED, non_blank};
use crate::db::books::BookRowUpdate;

/// A bulk action over ticked rows.
///
/// List pages submit one `ids` value per ticked checkbox, which
/// `serde_urlencoded` cannot collect, so the body is decoded by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkAction<A> {
    pub action: A,
    pub ids: Vec<i32>,
}

impl<A: DeserializeOwned> BulkAction<A> {
    /// Decode an `application/x-www-form-urlencoded` body.
    ///
    /// Returns `None` when the action is missing or unknown. Non-numeric ids
    /// are skipped.
    #[must_use]
    pub fn parse(body: &[u8]) -> Option<Self> {
        let mut action = None;
        let mut ids = Vec::new();
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "action" => {
                    let de = StrDeserializer::<ValueError>::new(value.as_ref());
                    action = A::deserialize(de).ok();
                }
                "ids" => {
                    if let Ok(id) = value.parse() {
                        ids.push(id);
                    }
                }
                _ => {}
            }
        }
        Some(Self {
            action: action?,
            ids,
        })
    }
}

/// The editable columns of the admin book list.
///
/// Each listed book posts `row=<id>` plus `price-<id>` and `stock-<id>`;
/// the `featured-<id>` and `available-<id>` checkboxes are sent only when
/// ticked.
#[derive(Debug, Clone, Default)]
pub struct BookRowsForm {
    rows: Vec<i32>,
    values: HashMap<String, String>,
}

impl BookRowsForm {
    /// Decode an `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn parse(body: &[u8]) -> Self {
        let mut form = Self::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            if key == "row" {
                if let Ok(id) = value.trim().parse() {
                    form.rows.push(id);
                }
            } else {
                form.values.insert(key.into_owned(), value.into_owned());
            }
        }
        form
    }

    fn value(&self, field: &str, id: i32) -> &str {
        self.values
            .get(&format!("{field}-{id}"))
            .map_or("", String::as_str)
    }

    /// # Errors
    ///
    /// Returns one message per bad cell, naming the book by id.
    pub fn validate(&self) -> Result<Vec<BookRowUpdate>, Vec<String>> {
        let mut problems = Vec::new();
        let mut rows = Vec::with_capacity(self.rows.len());

        for &id in &self.rows {
            let price = match Decimal::from_str(self.value("price", id).trim()) {
                Ok(d) if d > Decimal::ZERO => Some(Money::new(d).round_cents()),
                Ok(_) => {
                    problems.push(format!("Book #{id}: price must be greater than 0."));
                    None
                }
                Err(_) => {
                    problems.push(format!("Book #{id}: enter a number for the price."));
                    None
                }
            };
            let stock = match self.value("stock", id).trim().parse::<i32>() {
                Ok(n) if n >= 0 => Some(n),
                Ok(_) => {
                    problems.push(format!("Book #{id}: stock quantity cannot be negative."));
                    None
                }
                Err(_) => {
                    problems.push(format!("Book #{id}: enter a whole number for the stock."));
                    None
                }
            };
            if let (Some(price), Some(stock_quantity)) = (price, stock) {
                rows.push(BookRowUpdate {
                    id: BookId::new(id),
                    price,
                    stock_quantity,
                    featured: self.values.contains_key(&format!("featured-{id}")),
                    is_available: self.values.contains_key(&format!("available-{id}")),
                });
            }
        }

        if problems.is_empty() {
            Ok(rows)
        } else {
            Err(problems)
        }
    }
}

/// Admin coupon creation.
#[derive(Debug, Default, Deserialize)]
pub struct CouponCreateForm {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub valid_days: String,
}

/// A validated coupon ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCoupon {
    pub code: String,
    pub amount: Money,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
}

impl CouponCreateForm {
    /// Validity starts at `now` and lasts `valid_days` (default 30).
    ///
    /// # Errors
    ///
    /// Returns field errors for a bad code, non-positive amount, or
    /// non-positive duration.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<NewCoupon, FieldErrors> {
        let mut errors = FieldErrors::new();

        let code = normalize_coupon_code(&self.code)
            .map_err(|e| errors.add("code", e.to_string()))
            .ok();

        let amount = match non_blank(&self.amount) {
            None => {
                errors.add("amount", REQUIRED);
                None
            }
            Some(raw) => match Decimal::from_str(raw) {
                Ok(d) if d > Decimal::ZERO => Some(Money::new(d).round_cents()),
                Ok(_) => {
                    errors.add("amount", "Amount must be greater than 0.");
                    None
                }
                Err(_) => {
                    errors.add("amount", "Enter a number.");
                    None
                }
            },
        };

        let days = match non_blank(&self.valid_days) {
            None => 30,
            Some(raw) => match raw.parse::<i64>() {
                Ok(d) if (1..=3650).contains(&d) => d,
                _ => {
                    errors.add("valid_days", "Enter a number of days between 1 and 3650.");
                    30
                }
            },
        };

        match (code, amount) {
            (Some(code), Some(amount)) => errors.finish(NewCoupon {
                code,
                amount,
                valid_from: now,
                valid_to: now + Duration::days(days),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq, Deserialize)]
    #[serde(rename_all = "snake_case")]
    enum Action {
        MakeFeatured,
        ClearStock,
    }

    #[test]
    fn test_bulk_action_collects_repeated_ids() {
        let parsed = BulkAction::<Action>::parse(b"action=clear_stock&ids=3&ids=7&ids=x").unwrap();
        assert_eq!(parsed.action, Action::ClearStock);
        assert_eq!(parsed.ids, vec![3, 7]);
    }

    #[test]
    fn test_bulk_action_rejects_unknown_action() {
        assert!(BulkAction::<Action>::parse(b"action=burn_it&ids=1").is_none());
        assert!(BulkAction::<Action>::parse(b"ids=1").is_none());
    }

    #[test]
    fn test_book_rows_read_checkboxes_per_row() {
        let body = b"row=4&price-4=12.5&stock-4=3&featured-4=on&available-4=on\
                     &row=9&price-9=8&stock-9=0";
        let rows = BookRowsForm::parse(body).validate().unwrap();
        assert_eq!(
            rows,
            vec![
                BookRowUpdate {
                    id: BookId::new(4),
                    price: Money::from_cents(1250),
                    stock_quantity: 3,
                    featured: true,
                    is_available: true,
                },
                BookRowUpdate {
                    id: BookId::new(9),
                    price: Money::from_cents(800),
                    stock_quantity: 0,
                    featured: false,
                    is_available: false,
                },
            ]
        );
    }

    #[test]
    fn test_book_rows_report_each_bad_cell() {
        let body = b"row=2&price-2=0&stock-2=-1&row=3&price-3=abc&stock-3=5";
        let problems = BookRowsForm::parse(body).validate().unwrap_err();
        assert_eq!(
            problems,
            vec![
                "Book #2: price must be greater than 0.",
                "Book #2: stock quantity cannot be negative.",
                "Book #3: enter a number for the price.",
            ]
        );
    }

    #[test]
    fn test_coupon_create_defaults_to_thirty_days() {
        let now = Utc::now();
        let form = CouponCreateForm {
            code: " spring25 ".to_owned(),
            amount: "5".to_owned(),
            valid_days: String::new(),
        };
        let coupon = form.validate(now).unwrap();
        assert_eq!(coupon.code, "SPRING25");
        assert_eq!(coupon.amount, Money::from_cents(500));
        assert_eq!(coupon.valid_to - coupon.valid_from, Duration::days(30));
    }

    #[test]
    fn test_coupon_create_rejects_zero_amount() {
        let form = CouponCreateForm {
            code: "SAVE10".to_owned(),
            amount: "0".to_owned(),
            valid_days: "7".to_owned(),
        };
        assert!(form.validate(Utc::now()).unwrap_err().has("amount"));
    }
}
