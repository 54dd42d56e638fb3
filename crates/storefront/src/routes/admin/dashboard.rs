//! Back-office landing page.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::db::books::BookRepository;
use crate::db::orders::OrderRepository;
use crate::db::refunds::RefundRepository;
use crate::db::users::UserRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::{Layout, PageContext, RequireStaff};

/// Headline counts.
pub struct DashboardCounts {
    pub books: i64,
    pub low_stock: i64,
    pub open_refunds: i64,
    pub awaiting_delivery: i64,
    pub users: i64,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub current_path: &'static str,
    pub counts: DashboardCounts,
}

/// Counts that need staff attention.
#[instrument(skip(ctx, staff), fields(staff_id = %staff.0.id))]
pub async fn dashboard(ctx: PageContext, staff: RequireStaff) -> Result<impl IntoResponse> {
    let pool = ctx.state.pool();
    let (books, low_stock) = BookRepository::new(pool).stock_counts().await?;
    let counts = DashboardCounts {
        books,
        low_stock,
        open_refunds: RefundRepository::new(pool).open_count().await?,
        awaiting_delivery: OrderRepository::new(pool).awaiting_delivery().await?,
        users: UserRepository::new(pool).count().await?,
    };

    Ok(DashboardTemplate {
        current_path: "/admin",
        counts,
        layout: ctx.layout().await,
    })
}
