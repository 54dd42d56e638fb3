//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::db::books::BookRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::{Layout, PageContext};
use crate::routes::views::{BookCardView, cards};

const FEATURED_LIMIT: i64 = 6;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub featured: Vec<BookCardView>,
}

/// Display the home page with featured books.
#[instrument(skip(ctx))]
pub async fn home(ctx: PageContext) -> Result<impl IntoResponse> {
    let featured = BookRepository::new(ctx.state.pool())
        .featured(FEATURED_LIMIT)
        .await?;

    Ok(HomeTemplate {
        layout: ctx.layout().await,
        featured: cards(&featured),
    })
}
