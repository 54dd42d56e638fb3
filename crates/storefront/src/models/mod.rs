//! Domain models for the storefront.
//!
//! Row types decode straight from `PostgreSQL` via `sqlx::FromRow`; the
//! core crate's newtypes (`Money`, `Email`, ids, choice enums) carry their
//! own sqlx impls.

pub mod address;
pub mod book;
pub mod cart;
pub mod order;
pub mod profile;
pub mod session;
pub mod user;

pub use address::{Address, NewAddress};
pub use book::{
    Author, Book, BookImage, Category, CategoryLink, CategorySummary, Publisher, Review,
};
pub use cart::CartLine;
pub use order::{Coupon, Order, OrderLine, Payment, Refund};
pub use profile::{Profile, ProfileUpdate};
pub use session::{CurrentUser, FlashLevel, FlashMessage, keys as session_keys};
pub use user::User;
