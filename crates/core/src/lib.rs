//! BookBazar Core - Shared domain types.
//!
//! This crate provides the types shared by the BookBazar components:
//! - `storefront` - The bookstore web application (shop, account, staff back office)
//! - `cli` - Command-line tools for migrations, seeding, and staff management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Pricing, coupon windows, and order status live here
//! so they can be tested without a running database.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, money, emails, catalog choices, and pricing rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
