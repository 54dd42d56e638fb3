//! Coupon codes and validity windows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shortest accepted coupon code.
pub const MIN_CODE_LEN: usize = 4;
/// Longest accepted coupon code.
pub const MAX_CODE_LEN: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CouponCodeError {
    #[error("Promo code must be at least 4 characters long.")]
    TooShort,
    #[error("Promo code must be at most 15 characters long.")]
    TooLong,
}

/// Trim and upper-case a code as typed by a customer.
///
/// # Errors
///
/// Returns an error if the trimmed code is outside 4..=15 characters.
pub fn normalize_coupon_code(raw: &str) -> Result<String, CouponCodeError> {
    let code = raw.trim().to_uppercase();
    match code.chars().count() {
        n if n < MIN_CODE_LEN => Err(CouponCodeError::TooShort),
        n if n > MAX_CODE_LEN => Err(CouponCodeError::TooLong),
        _ => Ok(code),
    }
}

/// Why a coupon cannot be used right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CouponRejection {
    #[error("coupon is inactive")]
    Inactive,
    #[error("coupon is not valid yet")]
    NotYetValid,
    #[error("coupon has expired")]
    Expired,
}

/// When a coupon can be redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponWindow {
    pub active: bool,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
}

impl CouponWindow {
    /// Check the window at `now`; both ends are inclusive.
    ///
    /// # Errors
    ///
    /// Returns the reason the coupon is unusable.
    pub fn check(&self, now: DateTime<Utc>) -> Result<(), CouponRejection> {
        if !self.active {
            Err(CouponRejection::Inactive)
        } else if now < self.valid_from {
            Err(CouponRejection::NotYetValid)
        } else if now > self.valid_to {
            Err(CouponRejection::Expired)
        } else {
            Ok(())
        }
    }

    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.check(now).is_ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn window(active: bool) -> (CouponWindow, DateTime<Utc>) {
        let now = Utc::now();
        (
            CouponWindow {
                active,
                valid_from: now - Duration::days(1),
                valid_to: now + Duration::days(1),
            },
            now,
        )
    }

    #[test]
    fn test_code_is_normalized() {
        assert_eq!(normalize_coupon_code("  save10 ").unwrap(), "SAVE10");
        assert_eq!(normalize_coupon_code("abc"), Err(CouponCodeError::TooShort));
        assert_eq!(
            normalize_coupon_code("ABCDEFGHIJKLMNOP"),
            Err(CouponCodeError::TooLong)
        );
    }

    #[test]
    fn test_window_accepts_inside() {
        let (w, now) = window(true);
        assert!(w.is_valid_at(now));
        assert!(w.is_valid_at(w.valid_from));
        assert!(w.is_valid_at(w.valid_to));
    }

    #[test]
    fn test_expired_coupon_is_rejected() {
        let (w, now) = window(true);
        assert_eq!(
            w.check(now + Duration::days(2)),
            Err(CouponRejection::Expired)
        );
        assert_eq!(
            w.check(now - Duration::days(2)),
            Err(CouponRejection::NotYetValid)
        );
    }

    #[test]
    fn test_inactive_coupon_is_rejected() {
        let (w, now) = window(false);
        assert_eq!(w.check(now), Err(CouponRejection::Inactive));
    }
}
