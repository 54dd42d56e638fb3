//! Static content page route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::filters;
use crate::middleware::{Layout, PageContext};

/// Frequently asked questions.
#[derive(Template, WebTemplate)]
#[template(path = "pages/faq.html")]
pub struct FaqTemplate {
    pub layout: Layout,
}

/// Shipping, returns and store information.
#[derive(Template, WebTemplate)]
#[template(path = "pages/text.html")]
pub struct TextTemplate {
    pub layout: Layout,
}

/// Display the FAQ page.
#[instrument(skip(ctx))]
pub async fn faq(ctx: PageContext) -> impl IntoResponse {
    FaqTemplate {
        layout: ctx.layout().await,
    }
}

/// Display the store information page.
#[instrument(skip(ctx))]
pub async fn text(ctx: PageContext) -> impl IntoResponse {
    TextTemplate {
        layout: ctx.layout().await,
    }
}
