//! Book, category and review lists.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    body::Bytes,
    extract::Query,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use bookbazar_core::{BookId, CategoryId, ReviewId};

use crate::db::books::{BookAction, BookRepository};
use crate::db::categories::{CategoryOverview, CategoryRepository};
use crate::db::reviews::{ReviewAction, ReviewRepository};
use crate::error::Result;
use crate::filters;
use crate::forms::BookRowsForm;
use crate::middleware::{Layout, PageContext, RequireStaff};
use crate::models::{Book, FlashLevel, Review};
use crate::routes::views::stock_badge;

use super::{DATE_FORMAT, parse_bulk};

// =============================================================================
// View Types
// =============================================================================

/// `?q=` on list pages.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// One row of the book list.
pub struct AdminBookRow {
    pub id: BookId,
    pub slug: String,
    pub title: String,
    pub author: String,
    pub category: String,
    pub price: String,
    pub discount_price: Option<String>,
    pub stock: i32,
    pub stock_label: String,
    pub stock_class: &'static str,
    pub featured: bool,
    pub available: bool,
}

impl From<&Book> for AdminBookRow {
    fn from(book: &Book) -> Self {
        let (stock_label, stock_class) = stock_badge(book.stock_quantity);
        Self {
            id: book.id,
            slug: book.slug.clone(),
            title: book.title.clone(),
            author: book.author_display().to_owned(),
            category: book.category_name.clone().unwrap_or_default(),
            price: book.price.to_plain_string(),
            discount_price: book.discount_price.map(|p| p.to_string()),
            stock: book.stock_quantity,
            stock_label,
            stock_class,
            featured: book.featured,
            available: book.is_available,
        }
    }
}

/// One row of the category list.
pub struct AdminCategoryRow {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub parent: String,
    pub book_count: i64,
}

impl From<&CategoryOverview> for AdminCategoryRow {
    fn from(category: &CategoryOverview) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
            parent: category.parent_name.clone().unwrap_or_default(),
            book_count: category.book_count,
        }
    }
}

/// One row of the review list.
pub struct AdminReviewRow {
    pub id: ReviewId,
    pub book_title: String,
    pub user_email: String,
    pub stars: String,
    pub title: String,
    pub comment: String,
    pub approved: bool,
    pub date: String,
}

impl From<&Review> for AdminReviewRow {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id,
            book_title: review.book_title.clone(),
            user_email: review.user_email.clone(),
            stars: review.stars(),
            title: review.title.clone(),
            comment: review.comment.clone(),
            approved: review.is_approved,
            date: review.created_at.format(DATE_FORMAT).to_string(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "admin/books.html")]
pub struct BooksTemplate {
    pub layout: Layout,
    pub current_path: &'static str,
    pub query: String,
    pub books: Vec<AdminBookRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/categories.html")]
pub struct CategoriesTemplate {
    pub layout: Layout,
    pub current_path: &'static str,
    pub query: String,
    pub categories: Vec<AdminCategoryRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/reviews.html")]
pub struct ReviewsTemplate {
    pub layout: Layout,
    pub current_path: &'static str,
    pub reviews: Vec<AdminReviewRow>,
}

// =============================================================================
// Messages
// =============================================================================

fn book_message(action: BookAction, n: u64) -> String {
    match action {
        BookAction::MakeFeatured => format!("{n} books marked as featured."),
        BookAction::MakeUnfeatured => format!("{n} books marked as not featured."),
        BookAction::MarkAvailable => format!("{n} books marked as available."),
        BookAction::MarkUnavailable => format!("{n} books marked as unavailable."),
        BookAction::IncreaseStock => format!("Increased stock by 10 for {n} books."),
        BookAction::ClearStock => format!("Cleared stock for {n} books."),
    }
}

fn review_message(action: ReviewAction, n: u64) -> String {
    match action {
        ReviewAction::Approve => format!("{n} reviews approved."),
        ReviewAction::Unapprove => format!("{n} reviews unapproved."),
        ReviewAction::Delete => format!("{n} reviews deleted."),
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Books, searchable by title, author or ISBN.
#[instrument(skip(ctx, staff), fields(staff_id = %staff.0.id))]
pub async fn books(
    ctx: PageContext,
    staff: RequireStaff,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    let q = query.q.unwrap_or_default();
    let books = BookRepository::new(ctx.state.pool()).admin_list(&q).await?;
    Ok(BooksTemplate {
        current_path: "/admin/books",
        query: q,
        books: books.iter().map(AdminBookRow::from).collect(),
        layout: ctx.layout().await,
    })
}

/// Apply a bulk action to the ticked books.
#[instrument(skip(ctx, staff, body), fields(staff_id = %staff.0.id))]
pub async fn book_actions(ctx: PageContext, staff: RequireStaff, body: Bytes) -> Result<Response> {
    if let Some(bulk) = parse_bulk::<BookAction>(&ctx, &body).await {
        let n = BookRepository::new(ctx.state.pool())
            .apply_action(bulk.action, &bulk.ids)
            .await?;
        ctx.state.catalog().invalidate().await;
        tracing::info!(action = ?bulk.action, changed = n, "Book action applied");
        ctx.flash(FlashLevel::Success, book_message(bulk.action, n))
            .await;
    }
    Ok(Redirect::to("/admin/books").into_response())
}

/// Save the inline price, stock, featured and availability cells.
#[instrument(skip(ctx, staff, body), fields(staff_id = %staff.0.id))]
pub async fn save_books(ctx: PageContext, staff: RequireStaff, body: Bytes) -> Result<Response> {
    match BookRowsForm::parse(&body).validate() {
        Ok(rows) => {
            let n = BookRepository::new(ctx.state.pool()).save_rows(&rows).await?;
            ctx.state.catalog().invalidate().await;
            tracing::info!(rows = rows.len(), changed = n, "Book rows saved");
            ctx.flash(FlashLevel::Success, format!("{n} books updated."))
                .await;
        }
        Err(problems) => {
            tracing::debug!(problems = problems.len(), "Book rows rejected");
            for problem in problems {
                ctx.flash(FlashLevel::Error, problem).await;
            }
        }
    }
    Ok(Redirect::to("/admin/books").into_response())
}

/// Categories with how many books each holds, searchable by name.
#[instrument(skip(ctx, staff), fields(staff_id = %staff.0.id))]
pub async fn categories(
    ctx: PageContext,
    staff: RequireStaff,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    let q = query.q.unwrap_or_default();
    let categories = CategoryRepository::new(ctx.state.pool())
        .admin_list(&q)
        .await?;
    Ok(CategoriesTemplate {
        current_path: "/admin/categories",
        query: q,
        categories: categories.iter().map(AdminCategoryRow::from).collect(),
        layout: ctx.layout().await,
    })
}

/// Reviews, pending moderation first.
#[instrument(skip(ctx, staff), fields(staff_id = %staff.0.id))]
pub async fn reviews(ctx: PageContext, staff: RequireStaff) -> Result<impl IntoResponse> {
    let reviews = ReviewRepository::new(ctx.state.pool()).admin_list().await?;
    Ok(ReviewsTemplate {
        current_path: "/admin/reviews",
        reviews: reviews.iter().map(AdminReviewRow::from).collect(),
        layout: ctx.layout().await,
    })
}

/// Approve, unapprove or delete the ticked reviews.
#[instrument(skip(ctx, staff, body), fields(staff_id = %staff.0.id))]
pub async fn review_actions(
    ctx: PageContext,
    staff: RequireStaff,
    body: Bytes,
) -> Result<Response> {
    if let Some(bulk) = parse_bulk::<ReviewAction>(&ctx, &body).await {
        let n = ReviewRepository::new(ctx.state.pool())
            .apply_action(bulk.action, &bulk.ids)
            .await?;
        tracing::info!(action = ?bulk.action, changed = n, "Review action applied");
        ctx.flash(FlashLevel::Success, review_message(bulk.action, n))
            .await;
    }
    Ok(Redirect::to("/admin/reviews").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_messages() {
        assert_eq!(
            book_message(BookAction::MakeFeatured, 3),
            "3 books marked as featured."
        );
        assert_eq!(
            book_message(BookAction::IncreaseStock, 2),
            "Increased stock by 10 for 2 books."
        );
        assert_eq!(
            book_message(BookAction::ClearStock, 1),
            "Cleared stock for 1 books."
        );
    }

    #[test]
    fn test_category_row_without_parent() {
        let row = AdminCategoryRow::from(&CategoryOverview {
            id: CategoryId::new(2),
            name: "Poetry".to_owned(),
            slug: "poetry".to_owned(),
            parent_name: None,
            book_count: 11,
        });
        assert_eq!(row.parent, "");
        assert_eq!(row.book_count, 11);
    }

    #[test]
    fn test_review_messages() {
        assert_eq!(review_message(ReviewAction::Delete, 4), "4 reviews deleted.");
    }
}
