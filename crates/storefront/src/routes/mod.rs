//! HTTP route handlers for the bookshop.
//!
//! # Route Structure
//!
//! ```text
//! # Catalog
//! GET  /                                  - Home page
//! GET  /products                          - All books, paginated
//! GET  /products/category/{slug}          - Books in a category, paginated
//! GET  /product/{slug}                    - Book detail
//! POST /product/{slug}/reviews            - Create or update own review
//! GET  /categories                        - Top-level categories
//! GET  /categories/{slug}                 - Category with subcategories and books
//! GET  /authors/{slug}                    - Author page
//! GET  /search                            - Quick search
//! GET  /product-search                    - Advanced search
//!
//! # Cart
//! POST /add-to-cart/{slug}
//! POST /remove-from-cart/{slug}
//! POST /remove-single-item-from-cart/{slug}
//! GET  /order-summary
//! GET  /cart/count                        - Count badge fragment
//!
//! # Checkout (rate limited POSTs on coupon and payment)
//! GET  /checkout, POST /checkout
//! POST /add-coupon
//! GET  /payment/stripe, POST /payment/stripe
//! GET  /payment/paypal
//!
//! # Wishlist
//! POST /add-to-wish/{slug}
//! POST /remove-from-wish/{slug}
//! GET  /wish-summary
//!
//! # Users (rate limited POSTs on login and register)
//! GET  /users/register, POST /users/register
//! GET  /users/login, POST /users/login
//! POST /users/logout
//! GET  /users/profile
//! GET  /users/profile/edit, POST /users/profile/edit (multipart)
//! GET  /users/profile/change-password, POST ...
//!
//! # Account
//! GET  /account, POST /account            - Addresses
//! POST /account/addresses/{id}/default
//! POST /account/addresses/{id}/delete
//! GET  /account/orders
//! GET  /account/orders/{ref_code}
//! GET  /account/orders/{ref_code}/refund, POST ...
//!
//! # Pages
//! GET  /contact, POST /contact
//! GET  /faq
//! GET  /text
//!
//! # Staff catalog editing
//! GET  /add-product, POST /add-product (multipart)
//! GET  /edit-product/{slug}, POST ... (multipart, cover and gallery)
//! POST /edit-product/{slug}/images/{id}/primary
//! POST /edit-product/{slug}/images/{id}/delete
//! POST /delete-product/{slug}
//! GET  /edit-author/{slug}, POST ... (multipart)
//! GET  /add-category, POST /add-category
//!
//! # Back office (staff)
//! GET  /admin
//! GET  /admin/{books,orders,refunds,coupons,reviews,addresses,profiles}
//! GET  /admin/{categories,wishlists}      - Read-only lists
//! POST /admin/{...}/actions               - Bulk actions
//! POST /admin/books/save                  - Inline price/stock/flag edits
//! POST /admin/coupons                     - Create coupon
//! GET  /admin/payments
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod contact;
pub mod home;
pub mod pages;
pub mod products;
pub mod profile;
pub mod search;
pub mod staff;
pub mod upload;
pub mod views;
pub mod wishlist;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, checkout_rate_limiter};
use crate::state::AppState;

use self::upload::{PRODUCT_BODY_LIMIT, UPLOAD_BODY_LIMIT};

/// Catalog browsing and search.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/products", get(products::index))
        .route("/products/category/{slug}", get(products::by_category))
        .route("/product/{slug}", get(products::show))
        .route("/product/{slug}/reviews", post(products::submit_review))
        .route("/categories", get(categories::index))
        .route("/categories/{slug}", get(categories::show))
        .route("/authors/{slug}", get(categories::author))
        .route("/search", get(search::search))
        .route("/product-search", get(search::product_search))
}

/// Cart and wishlist.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/add-to-cart/{slug}", post(cart::add))
        .route("/remove-from-cart/{slug}", post(cart::remove))
        .route(
            "/remove-single-item-from-cart/{slug}",
            post(cart::remove_single),
        )
        .route("/order-summary", get(cart::summary))
        .route("/cart/count", get(cart::count))
        .route("/add-to-wish/{slug}", post(wishlist::add))
        .route("/remove-from-wish/{slug}", post(wishlist::remove))
        .route("/wish-summary", get(wishlist::summary))
}

/// Checkout and payment.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/checkout",
            get(checkout::checkout_page).post(checkout::checkout),
        )
        .route(
            "/add-coupon",
            post(checkout::add_coupon).layer(checkout_rate_limiter()),
        )
        .route(
            "/payment/stripe",
            get(checkout::stripe_page)
                .merge(post(checkout::stripe_pay).layer(checkout_rate_limiter())),
        )
        .route("/payment/paypal", get(checkout::paypal_page))
}

/// Registration, login and the profile pages.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(auth_rate_limiter())),
        )
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(auth_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
        .route("/profile", get(profile::show))
        .route(
            "/profile/edit",
            get(profile::edit_page)
                .post(profile::edit)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/profile/change-password",
            get(profile::change_password_page).post(profile::change_password),
        )
}

/// Addresses, order history and refunds.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index).post(account::add_address))
        .route(
            "/addresses/{id}/default",
            post(account::set_default_address),
        )
        .route("/addresses/{id}/delete", post(account::delete_address))
        .route("/orders", get(account::orders))
        .route("/orders/{ref_code}", get(account::order_detail))
        .route(
            "/orders/{ref_code}/refund",
            get(account::refund_page).post(account::request_refund),
        )
}

/// Contact form and static pages.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/contact", get(contact::contact_page).post(contact::contact))
        .route("/faq", get(pages::faq))
        .route("/text", get(pages::text))
}

/// Staff catalog editing on the storefront.
pub fn staff_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/add-product",
            get(staff::add_product_page)
                .post(staff::add_product)
                .layer(DefaultBodyLimit::max(PRODUCT_BODY_LIMIT)),
        )
        .route(
            "/edit-product/{slug}",
            get(staff::edit_product_page)
                .post(staff::edit_product)
                .layer(DefaultBodyLimit::max(PRODUCT_BODY_LIMIT)),
        )
        .route(
            "/edit-product/{slug}/images/{id}/primary",
            post(staff::make_primary_image),
        )
        .route(
            "/edit-product/{slug}/images/{id}/delete",
            post(staff::delete_image),
        )
        .route("/delete-product/{slug}", post(staff::delete_product))
        .route(
            "/edit-author/{slug}",
            get(staff::edit_author_page)
                .post(staff::edit_author)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/add-category",
            get(staff::add_category_page).post(staff::add_category),
        )
}

/// Back office.
pub fn admin_routes() -> Router<AppState> {
    use admin::{catalog, customers, dashboard, sales};

    Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/books", get(catalog::books))
        .route("/books/actions", post(catalog::book_actions))
        .route("/books/save", post(catalog::save_books))
        .route("/categories", get(catalog::categories))
        .route("/reviews", get(catalog::reviews))
        .route("/reviews/actions", post(catalog::review_actions))
        .route("/orders", get(sales::orders))
        .route("/orders/actions", post(sales::order_actions))
        .route("/refunds", get(sales::refunds))
        .route("/refunds/actions", post(sales::refund_actions))
        .route("/coupons", get(sales::coupons).post(sales::create_coupon))
        .route("/coupons/actions", post(sales::coupon_actions))
        .route("/payments", get(sales::payments))
        .route("/addresses", get(customers::addresses))
        .route("/addresses/actions", post(customers::address_actions))
        .route("/profiles", get(customers::profiles))
        .route("/profiles/actions", post(customers::profile_actions))
        .route("/wishlists", get(customers::wishlists))
}

/// Create all routes for the bookshop.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .merge(cart_routes())
        .merge(checkout_routes())
        .merge(page_routes())
        .merge(staff_routes())
        .nest("/users", user_routes())
        .nest("/account", account_routes())
        .nest("/admin", admin_routes())
}
