//! Category and author route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
};
use tracing::instrument;

use crate::db::authors::AuthorRepository;
use crate::db::books::BookRepository;
use crate::db::categories::CategoryRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{Layout, PageContext};
use crate::models::{Category, CategorySummary};
use crate::routes::products::paged_books;
use crate::routes::views::{BookCardView, CATEGORY_PAGE_SIZE, PageQuery, Pagination, cards};

/// Category index: the category list next to all books.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoryIndexTemplate {
    pub layout: Layout,
    pub categories: Vec<CategorySummary>,
    pub books: Vec<BookCardView>,
    pub pagination: Pagination,
}

/// One category with its sub-categories and books.
#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryDetailTemplate {
    pub layout: Layout,
    pub category: Category,
    pub children: Vec<Category>,
    pub books: Vec<BookCardView>,
    pub pagination: Pagination,
}

/// Author page with bio and books.
#[derive(Template, WebTemplate)]
#[template(path = "authors/show.html")]
pub struct AuthorTemplate {
    pub layout: Layout,
    pub name: String,
    pub slug: String,
    pub bio: String,
    pub photo_url: Option<String>,
    pub books: Vec<BookCardView>,
}

/// List categories and all books.
#[instrument(skip(ctx))]
pub async fn index(ctx: PageContext, Query(query): Query<PageQuery>) -> Result<impl IntoResponse> {
    let pool = ctx.state.pool();
    let categories = CategoryRepository::new(pool).summaries().await?;
    let repo = BookRepository::new(pool);
    let (books, pagination) =
        paged_books(&repo, None, &query, CATEGORY_PAGE_SIZE, "/categories").await?;

    Ok(CategoryIndexTemplate {
        layout: ctx.layout().await,
        categories,
        books: cards(&books),
        pagination,
    })
}

/// Category detail.
#[instrument(skip(ctx))]
pub async fn show(
    ctx: PageContext,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let pool = ctx.state.pool();
    let categories = CategoryRepository::new(pool);
    let category = categories
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;
    let children = categories.children(category.id).await?;

    let repo = BookRepository::new(pool);
    let base_path = format!("/categories/{}", category.slug);
    let (books, pagination) = paged_books(
        &repo,
        Some(category.id),
        &query,
        CATEGORY_PAGE_SIZE,
        &base_path,
    )
    .await?;

    Ok(CategoryDetailTemplate {
        layout: ctx.layout().await,
        category,
        children,
        books: cards(&books),
        pagination,
    })
}

/// Author page.
#[instrument(skip(ctx))]
pub async fn author(ctx: PageContext, Path(slug): Path<String>) -> Result<impl IntoResponse> {
    let pool = ctx.state.pool();
    let author = AuthorRepository::new(pool)
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("author {slug}")))?;
    let books = BookRepository::new(pool).list_by_author(author.id).await?;

    Ok(AuthorTemplate {
        layout: ctx.layout().await,
        name: author.name,
        slug: author.slug,
        bio: author.bio,
        photo_url: author.image,
        books: cards(&books),
    })
}
