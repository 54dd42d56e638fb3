//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::Path,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use bookbazar_core::BookPricing;

use crate::db::wishlists::{WishlistEntry, WishlistRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::{Layout, PageContext, RequireAuth};
use crate::models::{FlashLevel, book::PLACEHOLDER_COVER};
use crate::routes::products::book_or_404;

/// A saved book on the wishlist page.
#[derive(Clone)]
pub struct WishlistItemView {
    pub slug: String,
    pub title: String,
    pub author: String,
    pub cover_url: String,
    pub price: String,
    pub final_price: String,
    pub on_sale: bool,
    pub added: String,
}

impl From<&WishlistEntry> for WishlistItemView {
    fn from(entry: &WishlistEntry) -> Self {
        let pricing = BookPricing::new(entry.price, entry.discount_price);
        Self {
            slug: entry.slug.clone(),
            title: entry.title.clone(),
            author: entry
                .author_name
                .clone()
                .unwrap_or_else(|| "Unknown author".to_owned()),
            cover_url: entry
                .cover_image
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_COVER.to_owned()),
            price: pricing.price.to_string(),
            final_price: pricing.final_price().to_string(),
            on_sale: pricing.is_on_sale(),
            added: entry.added_date.format("%b %-d, %Y").to_string(),
        }
    }
}

/// Wishlist page.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/summary.html")]
pub struct WishlistTemplate {
    pub layout: Layout,
    pub items: Vec<WishlistItemView>,
}

/// Save a book to the wishlist.
#[instrument(skip(ctx, user), fields(user_id = %user.id))]
pub async fn add(
    ctx: PageContext,
    RequireAuth(user): RequireAuth,
    Path(slug): Path<String>,
) -> Result<Response> {
    let book = book_or_404(&ctx, &slug).await?;

    if WishlistRepository::new(ctx.state.pool())
        .add(user.id, book.id)
        .await?
    {
        ctx.flash(FlashLevel::Success, "Book was added to your wishlist")
            .await;
    } else {
        ctx.flash(FlashLevel::Warning, "Book was already in your wishlist")
            .await;
    }
    Ok(Redirect::to(&format!("/product/{}", book.slug)).into_response())
}

/// Drop a book from the wishlist.
#[instrument(skip(ctx, user), fields(user_id = %user.id))]
pub async fn remove(
    ctx: PageContext,
    RequireAuth(user): RequireAuth,
    Path(slug): Path<String>,
) -> Result<Response> {
    let book = book_or_404(&ctx, &slug).await?;

    if WishlistRepository::new(ctx.state.pool())
        .remove(user.id, book.id)
        .await?
    {
        ctx.flash(FlashLevel::Info, "Book was removed from your wishlist.")
            .await;
    }
    Ok(Redirect::to("/wish-summary").into_response())
}

/// The user's wishlist, newest first.
#[instrument(skip(ctx, user), fields(user_id = %user.id))]
pub async fn summary(ctx: PageContext, RequireAuth(user): RequireAuth) -> Result<impl IntoResponse> {
    let entries = WishlistRepository::new(ctx.state.pool())
        .list(user.id)
        .await?;

    Ok(WishlistTemplate {
        items: entries.iter().map(WishlistItemView::from).collect(),
        layout: ctx.layout().await,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use bookbazar_core::{BookId, Money, WishlistItemId};

    use super::*;

    fn entry(discount: Option<Money>) -> WishlistEntry {
        WishlistEntry {
            id: WishlistItemId::new(1),
            book_id: BookId::new(7),
            slug: "dune".to_owned(),
            title: "Dune".to_owned(),
            author_name: None,
            cover_image: None,
            price: Money::from_cents(2400),
            discount_price: discount,
            added_date: Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).single().unwrap(),
        }
    }

    #[test]
    fn test_view_defaults() {
        let view = WishlistItemView::from(&entry(None));
        assert_eq!(view.author, "Unknown author");
        assert_eq!(view.cover_url, PLACEHOLDER_COVER);
        assert_eq!(view.added, "Jan 5, 2024");
        assert!(!view.on_sale);
        assert_eq!(view.final_price, view.price);
    }

    #[test]
    fn test_view_on_sale() {
        let view = WishlistItemView::from(&entry(Some(Money::from_cents(1800))));
        assert!(view.on_sale);
        assert_eq!(view.final_price, "$18.00");
    }
}
