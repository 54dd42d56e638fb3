//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Email and password accounts (Argon2id)
//! - `checkout` - Coupon redemption and the payment transaction
//! - `stripe` - Payment gateway client behind the `PaymentGateway` trait
//! - `email` - Contact form and order confirmation mail (lettre)
//! - `uploads` - Book cover and profile photo storage
//! - `catalog_cache` - Sidebar categories (moka)
//! - `flash` - Session flash messages

pub mod auth;
pub mod catalog_cache;
pub mod checkout;
pub mod email;
pub mod flash;
pub mod stripe;
pub mod uploads;
