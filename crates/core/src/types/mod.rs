//! Core types for BookBazar.
//!
//! This module provides type-safe wrappers for the bookstore's domain concepts.

pub mod catalog;
pub mod choice;
pub mod coupon;
pub mod email;
pub mod id;
pub mod preferences;
pub mod price;
pub mod pricing;
pub mod slug;
pub mod status;

pub use catalog::{BookCondition, BookFormat, BookLabel, Genre};
pub use choice::ChoiceError;
pub use coupon::{
    CouponCodeError, CouponRejection, CouponWindow, MAX_CODE_LEN, MIN_CODE_LEN, normalize_coupon_code,
};
pub use email::{Email, EmailError};
pub use id::*;
pub use preferences::{DisplayCurrency, Language};
pub use price::Money;
pub use pricing::{BookPricing, CartTotals, PricedLine, order_total, tax_rate};
pub use slug::{slug_candidate, slugify};
pub use status::{
    AddressType, OrderFlags, OrderStatus, PaymentOption, REF_CODE_ALPHABET, REF_CODE_LEN,
    is_valid_ref_code,
};
