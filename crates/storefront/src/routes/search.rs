//! Search route handlers.
//!
//! `/search` is the header quick search; `/product-search` is the advanced
//! form with category and price bounds.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::Query, response::IntoResponse};
use serde::Deserialize;
use tracing::instrument;

use crate::db::books::{BookRepository, ProductFilter};
use crate::db::categories::CategoryRepository;
use crate::error::Result;
use crate::filters;
use crate::forms::{FieldErrors, ProductSearchForm};
use crate::middleware::{Layout, PageContext};
use crate::models::Category;
use crate::routes::views::{BookCardView, cards};

/// Quick search query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Quick search results.
#[derive(Template, WebTemplate)]
#[template(path = "search/results.html")]
pub struct SearchTemplate {
    pub layout: Layout,
    pub query: String,
    pub books: Vec<BookCardView>,
}

/// Advanced search page.
#[derive(Template, WebTemplate)]
#[template(path = "search/product_search.html")]
pub struct ProductSearchTemplate {
    pub layout: Layout,
    pub form: ProductSearchForm,
    pub errors: FieldErrors,
    pub categories: Vec<Category>,
    pub books: Vec<BookCardView>,
}

impl ProductSearchTemplate {
    /// Whether a category option should be pre-selected.
    fn is_selected(&self, category: &Category) -> bool {
        self.form.category.trim() == category.id.to_string()
    }
}

/// Substring search over title, description, author, ISBNs and price.
#[instrument(skip(ctx))]
pub async fn search(ctx: PageContext, Query(query): Query<SearchQuery>) -> Result<impl IntoResponse> {
    let books = BookRepository::new(ctx.state.pool())
        .search(&query.q)
        .await?;
    tracing::debug!(query = %query.q, results = books.len(), "Quick search");

    Ok(SearchTemplate {
        layout: ctx.layout().await,
        query: query.q,
        books: cards(&books),
    })
}

/// Advanced product search. An invalid form lists every book unfiltered.
#[instrument(skip(ctx))]
pub async fn product_search(
    ctx: PageContext,
    Query(form): Query<ProductSearchForm>,
) -> Result<impl IntoResponse> {
    let pool = ctx.state.pool();
    let (filter, errors) = match form.validate() {
        Ok(filter) => (filter, FieldErrors::new()),
        Err(errors) => (ProductFilter::default(), errors),
    };
    let books = BookRepository::new(pool).product_search(&filter).await?;
    let categories = CategoryRepository::new(pool).list().await?;

    Ok(ProductSearchTemplate {
        layout: ctx.layout().await,
        form,
        errors,
        categories,
        books: cards(&books),
    })
}
