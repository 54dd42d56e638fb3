//! Cart route handlers.
//!
//! The cart is a `cart_item` row per book, owned by the signed-in user.
//! Every mutation is a POST that flashes a message and redirects.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::Path,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use bookbazar_core::{CartTotals, PricedLine, order_total};

use crate::db::carts::{AddOutcome, CartRepository, RemoveOneOutcome};
use crate::db::coupons::CouponRepository;
use crate::db::orders::OrderRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::{Layout, PageContext, RequireAuth, login_url};
use crate::models::{Book, CartLine, FlashLevel, book::PLACEHOLDER_COVER};
use crate::routes::products::book_or_404;

// =============================================================================
// View Types
// =============================================================================

/// One cart line as shown on the order summary.
#[derive(Clone)]
pub struct CartItemView {
    pub slug: String,
    pub title: String,
    pub author: String,
    pub cover_url: String,
    pub quantity: i32,
    pub unit_price: String,
    pub unit_final_price: String,
    pub on_sale: bool,
    pub line_total: String,
    pub line_final: String,
    pub line_saving: String,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        let pricing = line.pricing();
        let priced = line.priced();
        Self {
            slug: line.slug.clone(),
            title: line.title.clone(),
            author: line
                .author_name
                .clone()
                .unwrap_or_else(|| "Unknown author".to_owned()),
            cover_url: line
                .cover_image
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_COVER.to_owned()),
            quantity: line.quantity,
            unit_price: pricing.price.to_string(),
            unit_final_price: pricing.final_price().to_string(),
            on_sale: pricing.is_on_sale(),
            line_total: priced.line_total().to_string(),
            line_final: priced.line_final().to_string(),
            line_saving: priced.line_discount().to_string(),
        }
    }
}

/// Cart totals, preformatted.
#[derive(Clone)]
pub struct TotalsView {
    pub total_items: u32,
    pub subtotal: String,
    pub total_discount: String,
    pub has_discount: bool,
    pub final_total: String,
    pub tax: String,
    pub grand_total: String,
}

impl From<&CartTotals> for TotalsView {
    fn from(totals: &CartTotals) -> Self {
        Self {
            total_items: totals.total_items,
            subtotal: totals.subtotal.to_string(),
            total_discount: totals.total_discount.to_string(),
            has_discount: totals.total_discount.is_positive(),
            final_total: totals.final_total.to_string(),
            tax: totals.tax.to_string(),
            grand_total: totals.grand_total.to_string(),
        }
    }
}

/// Coupon attached to the open order.
#[derive(Clone)]
pub struct AppliedCouponView {
    pub code: String,
    pub amount: String,
    pub order_total: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Order summary (cart) page.
#[derive(Template, WebTemplate)]
#[template(path = "cart/summary.html")]
pub struct OrderSummaryTemplate {
    pub layout: Layout,
    pub items: Vec<CartItemView>,
    pub totals: TotalsView,
    pub coupon: Option<AppliedCouponView>,
}

/// Cart count badge fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: i64,
}

// =============================================================================
// Helpers
// =============================================================================

/// Warning shown when a book cannot go into a cart.
fn out_of_stock_message(book: &Book) -> Option<String> {
    (!book.can_purchase()).then(|| format!("Sorry, {} is out of stock.", book.title))
}

// =============================================================================
// Routes
// =============================================================================

/// Add one copy of a book to the cart.
#[instrument(skip(ctx, user), fields(user_id = %user.id))]
pub async fn add(
    ctx: PageContext,
    RequireAuth(user): RequireAuth,
    Path(slug): Path<String>,
) -> Result<Response> {
    let book = book_or_404(&ctx, &slug).await?;

    if let Some(message) = out_of_stock_message(&book) {
        tracing::info!(book_id = %book.id, "Add to cart rejected: out of stock");
        ctx.flash(FlashLevel::Warning, message).await;
        return Ok(Redirect::to("/").into_response());
    }

    let outcome = CartRepository::new(ctx.state.pool())
        .add(user.id, book.id, book.stock_quantity)
        .await?;
    tracing::info!(book_id = %book.id, ?outcome, "Cart updated");

    let redirect = match outcome {
        AddOutcome::Added => {
            ctx.flash(FlashLevel::Success, format!("{} added to your cart!", book.title))
                .await;
            "/"
        }
        AddOutcome::Incremented => {
            ctx.flash(
                FlashLevel::Info,
                format!("{} quantity updated in your cart!", book.title),
            )
            .await;
            "/order-summary"
        }
        AddOutcome::AtStockLimit => {
            ctx.flash(
                FlashLevel::Info,
                format!(
                    "Only {} copies of {} are available.",
                    book.stock_quantity, book.title
                ),
            )
            .await;
            "/order-summary"
        }
    };
    Ok(Redirect::to(redirect).into_response())
}

/// Remove a book's line from the cart.
#[instrument(skip(ctx, user), fields(user_id = %user.id))]
pub async fn remove(
    ctx: PageContext,
    RequireAuth(user): RequireAuth,
    Path(slug): Path<String>,
) -> Result<Response> {
    let book = book_or_404(&ctx, &slug).await?;

    if CartRepository::new(ctx.state.pool())
        .remove(user.id, book.id)
        .await?
    {
        ctx.flash(FlashLevel::Info, "Book was removed from your cart.")
            .await;
        Ok(Redirect::to("/order-summary").into_response())
    } else {
        ctx.flash(FlashLevel::Info, "This book was not in your cart")
            .await;
        Ok(Redirect::to(&format!("/product/{}", book.slug)).into_response())
    }
}

/// Take one copy of a book out of the cart.
#[instrument(skip(ctx, user), fields(user_id = %user.id))]
pub async fn remove_single(
    ctx: PageContext,
    RequireAuth(user): RequireAuth,
    Path(slug): Path<String>,
) -> Result<Response> {
    let book = book_or_404(&ctx, &slug).await?;

    let outcome = CartRepository::new(ctx.state.pool())
        .remove_one(user.id, book.id)
        .await?;
    let message = match outcome {
        RemoveOneOutcome::Decremented => "Book quantity was updated.",
        RemoveOneOutcome::Removed => "Book was removed from your cart.",
        RemoveOneOutcome::NotInCart => {
            ctx.flash(FlashLevel::Info, "This book was not in your cart")
                .await;
            return Ok(Redirect::to(&format!("/product/{}", book.slug)).into_response());
        }
    };
    ctx.flash(FlashLevel::Info, message).await;
    Ok(Redirect::to("/order-summary").into_response())
}

/// The order summary: cart lines, totals and any applied coupon.
#[instrument(skip(ctx))]
pub async fn summary(ctx: PageContext) -> Result<Response> {
    let Some(user) = ctx.user.clone() else {
        ctx.flash(FlashLevel::Warning, "Please login to view your cart.")
            .await;
        return Ok(Redirect::to(&login_url("/order-summary")).into_response());
    };
    let pool = ctx.state.pool();

    let lines = CartRepository::new(pool).lines(user.id).await?;
    let priced: Vec<PricedLine> = lines.iter().map(CartLine::priced).collect();
    let totals = CartTotals::from_lines(&priced);

    let coupon = match OrderRepository::new(pool).open_order(user.id).await? {
        Some(order) => match order.coupon_id {
            Some(id) => CouponRepository::new(pool).get(id).await?,
            None => None,
        },
        None => None,
    };
    let coupon = coupon.map(|c| AppliedCouponView {
        code: c.code,
        amount: c.amount.to_string(),
        order_total: order_total(&priced, Some(c.amount)).to_string(),
    });

    Ok(OrderSummaryTemplate {
        layout: ctx.layout().await,
        items: lines.iter().map(CartItemView::from).collect(),
        totals: TotalsView::from(&totals),
        coupon,
    }
    .into_response())
}

/// Cart badge fragment.
#[instrument(skip(ctx))]
pub async fn count(ctx: PageContext) -> Result<impl IntoResponse> {
    let count = match &ctx.user {
        Some(user) => CartRepository::new(ctx.state.pool())
            .line_count(user.id)
            .await?,
        None => 0,
    };
    Ok(CartCountTemplate { count })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use bookbazar_core::{BookCondition, BookFormat, BookId, CartItemId, Money};

    use super::*;

    fn book(stock: i32, available: bool) -> Book {
        Book {
            id: BookId::new(7),
            title: "Middlemarch".to_owned(),
            slug: "middlemarch".to_owned(),
            author_id: None,
            author_name: None,
            author_slug: None,
            additional_authors: String::new(),
            isbn: None,
            isbn13: None,
            category_id: None,
            category_name: None,
            category_slug: None,
            genre: None,
            format: BookFormat::Paperback,
            condition: BookCondition::New,
            publisher_id: None,
            publisher_name: None,
            publication_date: None,
            edition: String::new(),
            pages: None,
            language: "English".to_owned(),
            price: Money::from_cents(1500),
            discount_price: None,
            featured: false,
            label1: None,
            label2: None,
            label3: None,
            cover_image: None,
            description: "A study of provincial life.".to_owned(),
            excerpt: String::new(),
            stock_quantity: stock,
            is_available: available,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_out_of_stock_book_is_rejected() {
        assert_eq!(
            out_of_stock_message(&book(0, true)).as_deref(),
            Some("Sorry, Middlemarch is out of stock.")
        );
        assert!(out_of_stock_message(&book(3, false)).is_some());
        assert_eq!(out_of_stock_message(&book(3, true)), None);
    }

    #[test]
    fn test_cart_item_view_prices() {
        let line = CartLine {
            id: CartItemId::new(1),
            book_id: BookId::new(7),
            slug: "middlemarch".to_owned(),
            title: "Middlemarch".to_owned(),
            author_name: Some("George Eliot".to_owned()),
            cover_image: None,
            price: Money::from_cents(1500),
            discount_price: Some(Money::from_cents(1200)),
            quantity: 2,
            stock_quantity: 5,
            is_available: true,
            added_at: Utc::now(),
        };
        let view = CartItemView::from(&line);
        assert!(view.on_sale);
        assert_eq!(view.line_total, "$30.00");
        assert_eq!(view.line_final, "$24.00");
        assert_eq!(view.line_saving, "$6.00");
        assert_eq!(view.cover_url, PLACEHOLDER_COVER);
    }
}
