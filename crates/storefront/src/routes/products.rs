//! Book listing and detail route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use tracing::instrument;

use bookbazar_core::CategoryId;

use crate::db::RepositoryError;
use crate::db::book_images::BookImageRepository;
use crate::db::books::BookRepository;
use crate::db::categories::CategoryRepository;
use crate::db::reviews::ReviewRepository;
use crate::db::wishlists::WishlistRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::ReviewForm;
use crate::middleware::{Layout, PageContext, RequireAuth};
use crate::models::{Book, BookImage, FlashLevel, Review, book::stars};
use crate::routes::views::{
    BookCardView, LabelView, PRODUCTS_PER_PAGE, PageQuery, Pagination, cards,
};

const RELATED_LIMIT: i64 = 3;

// =============================================================================
// View Types
// =============================================================================

/// Everything the detail page shows about one book.
pub struct BookDetailView {
    pub card: BookCardView,
    pub book: Book,
    pub saving: String,
    pub genre: Option<&'static str>,
    pub format: &'static str,
    pub condition: &'static str,
    pub publication_date: Option<String>,
    pub stock_quantity: i32,
}

impl From<Book> for BookDetailView {
    fn from(book: Book) -> Self {
        Self {
            card: BookCardView::from(&book),
            saving: book.pricing().unit_saving().to_string(),
            genre: book.genre.map(|g| g.label()),
            format: book.format.label(),
            condition: book.condition.label(),
            publication_date: book
                .publication_date
                .map(|d| d.format("%B %-d, %Y").to_string()),
            stock_quantity: book.stock_quantity,
            book,
        }
    }
}

/// A published review.
pub struct ReviewView {
    pub stars: String,
    pub title: String,
    pub comment: String,
    pub author: String,
    pub date: String,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            stars: review.stars(),
            title: review.title.clone(),
            comment: review.comment.clone(),
            author: review
                .user_email
                .split('@')
                .next()
                .unwrap_or_default()
                .to_owned(),
            date: review.created_at.format("%b %-d, %Y").to_string(),
        }
    }
}

/// Mean rating to one decimal place, with its star rendering.
fn average_rating(reviews: &[Review]) -> Option<(String, String)> {
    if reviews.is_empty() {
        return None;
    }
    let sum: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
    let count = i64::try_from(reviews.len()).ok()?;
    let mean = (Decimal::from(sum) / Decimal::from(count)).round_dp(1);
    let rounded = i16::try_from(sum / count).unwrap_or(0);
    Some((mean.to_string(), stars(rounded)))
}

// =============================================================================
// Templates
// =============================================================================

/// Book listing page (all books or one category).
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductListTemplate {
    pub layout: Layout,
    pub heading: String,
    pub books: Vec<BookCardView>,
    pub pagination: Pagination,
}

/// Book detail page.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductDetailTemplate {
    pub layout: Layout,
    pub detail: BookDetailView,
    pub labels: Vec<LabelView>,
    pub reviews: Vec<ReviewView>,
    pub average: Option<(String, String)>,
    pub related: Vec<BookCardView>,
    pub in_wishlist: bool,
    pub gallery: Vec<BookImage>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Load a book by slug or fail with 404.
pub(crate) async fn book_or_404(ctx: &PageContext, slug: &str) -> Result<Book> {
    BookRepository::new(ctx.state.pool())
        .get_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("book {slug}")))
}

/// Fetch one page of books; out-of-range pages fall back to the last one.
pub(crate) async fn paged_books(
    repo: &BookRepository<'_>,
    category: Option<CategoryId>,
    query: &PageQuery,
    per_page: i64,
    base_path: &str,
) -> std::result::Result<(Vec<Book>, Pagination), RepositoryError> {
    let fetch = |offset: i64| async move {
        match category {
            Some(id) => repo.list_by_category(id, per_page, offset).await,
            None => repo.list_page(per_page, offset).await,
        }
    };

    let requested = query.requested();
    let (mut books, total) = fetch((requested - 1) * per_page).await?;
    let pagination = Pagination::new(requested, total, per_page, base_path);
    if pagination.page != requested {
        books = fetch(pagination.offset(per_page)).await?.0;
    }
    Ok((books, pagination))
}

// =============================================================================
// Routes
// =============================================================================

/// All books, newest first.
#[instrument(skip(ctx))]
pub async fn index(ctx: PageContext, Query(query): Query<PageQuery>) -> Result<impl IntoResponse> {
    let repo = BookRepository::new(ctx.state.pool());
    let (books, pagination) =
        paged_books(&repo, None, &query, PRODUCTS_PER_PAGE, "/products").await?;

    Ok(ProductListTemplate {
        layout: ctx.layout().await,
        heading: "All Books".to_owned(),
        books: cards(&books),
        pagination,
    })
}

/// Books in one category.
#[instrument(skip(ctx))]
pub async fn by_category(
    ctx: PageContext,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let category = CategoryRepository::new(ctx.state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;

    let repo = BookRepository::new(ctx.state.pool());
    let base_path = format!("/products/category/{}", category.slug);
    let (books, pagination) = paged_books(
        &repo,
        Some(category.id),
        &query,
        PRODUCTS_PER_PAGE,
        &base_path,
    )
    .await?;

    Ok(ProductListTemplate {
        layout: ctx.layout().await,
        heading: category.name,
        books: cards(&books),
        pagination,
    })
}

/// Book detail page.
#[instrument(skip(ctx))]
pub async fn show(ctx: PageContext, Path(slug): Path<String>) -> Result<impl IntoResponse> {
    let book = book_or_404(&ctx, &slug).await?;
    let pool = ctx.state.pool();

    let reviews = ReviewRepository::new(pool).approved_for_book(book.id).await?;
    let gallery = BookImageRepository::new(pool).list(book.id).await?;
    let related = BookRepository::new(pool).related(&book, RELATED_LIMIT).await?;
    let in_wishlist = match &ctx.user {
        Some(user) => WishlistRepository::new(pool).contains(user.id, book.id).await?,
        None => false,
    };

    Ok(ProductDetailTemplate {
        layout: ctx.layout().await,
        labels: book.labels().into_iter().map(LabelView::from).collect(),
        average: average_rating(&reviews),
        reviews: reviews.iter().map(ReviewView::from).collect(),
        related: cards(&related),
        in_wishlist,
        gallery,
        detail: BookDetailView::from(book),
    })
}

/// Create or update the signed-in user's review of a book.
#[instrument(skip(ctx, user, form), fields(user_id = %user.id))]
pub async fn submit_review(
    ctx: PageContext,
    RequireAuth(user): RequireAuth,
    Path(slug): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let book = book_or_404(&ctx, &slug).await?;
    let back = format!("/product/{}", book.slug);

    match form.validate() {
        Ok(review) => {
            ReviewRepository::new(ctx.state.pool())
                .upsert(book.id, user.id, review.rating, &review.title, &review.comment)
                .await?;
            tracing::info!(book_id = %book.id, rating = review.rating, "Review submitted");
            ctx.flash(
                FlashLevel::Success,
                "Thanks! Your review will appear once approved.",
            )
            .await;
        }
        Err(errors) => {
            for (_, message) in errors.iter() {
                ctx.flash(FlashLevel::Warning, message).await;
            }
        }
    }

    Ok(Redirect::to(&back).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use bookbazar_core::{BookId, ReviewId, UserId};

    use super::*;

    fn review(rating: i16) -> Review {
        Review {
            id: ReviewId::new(1),
            book_id: BookId::new(1),
            book_title: "Dune".to_owned(),
            user_id: UserId::new(1),
            user_email: "paul@arrakis.example".to_owned(),
            rating,
            title: String::new(),
            comment: String::new(),
            is_approved: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_average_rating() {
        assert_eq!(average_rating(&[]), None);
        let (mean, stars) = average_rating(&[review(5), review(4), review(4)]).unwrap();
        assert_eq!(mean, "4.3");
        assert_eq!(stars, "★★★★☆");
    }

    #[test]
    fn test_review_author_is_local_part() {
        assert_eq!(ReviewView::from(&review(3)).author, "paul");
    }
}
