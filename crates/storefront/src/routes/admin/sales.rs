//! Orders, refunds, coupons and payments.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    body::Bytes,
    extract::Query,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use bookbazar_core::{CouponId, OrderId, RefundId};

use crate::db::RepositoryError;
use crate::db::coupons::{CouponAction, CouponRepository};
use crate::db::orders::{OrderAction, OrderFilter, OrderOverview, OrderRepository};
use crate::db::payments::PaymentRepository;
use crate::db::refunds::{RefundAction, RefundRepository};
use crate::error::Result;
use crate::filters;
use crate::forms::{CouponCreateForm, FieldErrors};
use crate::middleware::{Layout, PageContext, RequireStaff};
use crate::models::{Coupon, FlashLevel, Payment, Refund};
use crate::routes::views::{ChoiceView, choice_options};

use super::{DATE_FORMAT, parse_bulk};

// =============================================================================
// Query Types
// =============================================================================

/// `?q=&status=` on the order list.
#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub q: Option<String>,
    pub status: Option<String>,
}

impl OrderQuery {
    /// Unknown status codes list every paid order.
    fn filter(&self) -> Option<OrderFilter> {
        let code = self.status.as_deref()?;
        OrderFilter::ALL.into_iter().find(|f| f.as_str() == code)
    }
}

// =============================================================================
// View Types
// =============================================================================

pub struct AdminOrderRow {
    pub id: OrderId,
    pub ref_code: String,
    pub email: String,
    pub date: String,
    pub status: &'static str,
    pub total: String,
    pub being_delivered: bool,
    pub received: bool,
    pub refund_requested: bool,
    pub refund_granted: bool,
}

impl From<&OrderOverview> for AdminOrderRow {
    fn from(overview: &OrderOverview) -> Self {
        let order = &overview.order;
        Self {
            id: order.id,
            ref_code: order.ref_code.clone().unwrap_or_default(),
            email: overview.user_email.clone(),
            date: order
                .ordered_date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            status: order.status().label(),
            total: overview.total.to_string(),
            being_delivered: order.being_delivered,
            received: order.received,
            refund_requested: order.refund_requested,
            refund_granted: order.refund_granted,
        }
    }
}

pub struct AdminRefundRow {
    pub id: RefundId,
    pub ref_code: String,
    pub reason: String,
    pub email: String,
    pub accepted: bool,
    pub date: String,
}

impl From<&Refund> for AdminRefundRow {
    fn from(refund: &Refund) -> Self {
        Self {
            id: refund.id,
            ref_code: refund.order_ref_code.clone().unwrap_or_default(),
            reason: refund.reason.clone(),
            email: refund.email.clone(),
            accepted: refund.accepted,
            date: refund.created_at.format(DATE_FORMAT).to_string(),
        }
    }
}

pub struct AdminCouponRow {
    pub id: CouponId,
    pub code: String,
    pub amount: String,
    pub valid_from: String,
    pub valid_to: String,
    pub state: &'static str,
    pub state_class: &'static str,
}

impl AdminCouponRow {
    fn new(coupon: &Coupon, now: DateTime<Utc>) -> Self {
        let (state, state_class) = if !coupon.active {
            ("Inactive", "badge-muted")
        } else if coupon.window().is_valid_at(now) {
            ("Valid", "badge-success")
        } else if now < coupon.valid_from {
            ("Scheduled", "badge-info")
        } else {
            ("Expired", "badge-muted")
        };
        Self {
            id: coupon.id,
            code: coupon.code.clone(),
            amount: coupon.amount.to_string(),
            valid_from: coupon.valid_from.format(DATE_FORMAT).to_string(),
            valid_to: coupon.valid_to.format(DATE_FORMAT).to_string(),
            state,
            state_class,
        }
    }
}

pub struct AdminPaymentRow {
    pub charge_id: String,
    pub email: String,
    pub amount: String,
    pub date: String,
}

impl From<&Payment> for AdminPaymentRow {
    fn from(payment: &Payment) -> Self {
        Self {
            charge_id: payment.stripe_charge_id.clone(),
            email: payment.user_email.clone().unwrap_or_default(),
            amount: payment.amount.to_string(),
            date: payment.created_at.format(DATE_FORMAT).to_string(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub current_path: &'static str,
    pub query: String,
    pub statuses: Vec<ChoiceView>,
    pub orders: Vec<AdminOrderRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/refunds.html")]
pub struct RefundsTemplate {
    pub layout: Layout,
    pub current_path: &'static str,
    pub refunds: Vec<AdminRefundRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/coupons.html")]
pub struct CouponsTemplate {
    pub layout: Layout,
    pub current_path: &'static str,
    pub coupons: Vec<AdminCouponRow>,
    pub form: CouponCreateForm,
    pub errors: FieldErrors,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/payments.html")]
pub struct PaymentsTemplate {
    pub layout: Layout,
    pub current_path: &'static str,
    pub payments: Vec<AdminPaymentRow>,
}

// =============================================================================
// Messages
// =============================================================================

fn order_message(action: OrderAction, n: u64) -> String {
    match action {
        OrderAction::MarkDelivered => format!("{n} orders marked as delivered."),
        OrderAction::MarkReceived => format!("{n} orders marked as received."),
        OrderAction::GrantRefunds => format!("{n} orders granted refunds."),
    }
}

fn refund_message(action: RefundAction, n: u64) -> String {
    match action {
        RefundAction::AcceptRefunds => format!("{n} refund requests accepted."),
        RefundAction::RejectRefunds => format!("{n} refund requests rejected."),
    }
}

fn coupon_message(action: CouponAction, n: u64) -> String {
    match action {
        CouponAction::Activate => format!("{n} coupons activated."),
        CouponAction::Deactivate => format!("{n} coupons deactivated."),
    }
}

async fn render_coupons(
    ctx: &PageContext,
    form: CouponCreateForm,
    errors: FieldErrors,
) -> Result<Response> {
    let now = Utc::now();
    let coupons = CouponRepository::new(ctx.state.pool()).list().await?;
    Ok(CouponsTemplate {
        current_path: "/admin/coupons",
        coupons: coupons.iter().map(|c| AdminCouponRow::new(c, now)).collect(),
        form,
        errors,
        layout: ctx.layout().await,
    }
    .into_response())
}

// =============================================================================
// Order Routes
// =============================================================================

/// Paid orders, searchable by ref code or email and filterable by status.
#[instrument(skip(ctx, staff), fields(staff_id = %staff.0.id))]
pub async fn orders(
    ctx: PageContext,
    staff: RequireStaff,
    Query(query): Query<OrderQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.filter();
    let q = query.q.unwrap_or_default();
    let orders = OrderRepository::new(ctx.state.pool())
        .admin_list(&q, filter)
        .await?;

    Ok(OrdersTemplate {
        current_path: "/admin/orders",
        query: q,
        statuses: choice_options(
            OrderFilter::ALL.iter().map(|f| (f.as_str(), f.label())),
            filter.map_or("", OrderFilter::as_str),
        ),
        orders: orders.iter().map(AdminOrderRow::from).collect(),
        layout: ctx.layout().await,
    })
}

/// Move the ticked orders along.
#[instrument(skip(ctx, staff, body), fields(staff_id = %staff.0.id))]
pub async fn order_actions(
    ctx: PageContext,
    staff: RequireStaff,
    body: Bytes,
) -> Result<Response> {
    if let Some(bulk) = parse_bulk::<OrderAction>(&ctx, &body).await {
        let n = OrderRepository::new(ctx.state.pool())
            .apply_action(bulk.action, &bulk.ids)
            .await?;
        tracing::info!(action = ?bulk.action, changed = n, "Order action applied");
        ctx.flash(FlashLevel::Success, order_message(bulk.action, n))
            .await;
    }
    Ok(Redirect::to("/admin/orders").into_response())
}

// =============================================================================
// Refund Routes
// =============================================================================

/// Refund requests, newest first.
#[instrument(skip(ctx, staff), fields(staff_id = %staff.0.id))]
pub async fn refunds(ctx: PageContext, staff: RequireStaff) -> Result<impl IntoResponse> {
    let refunds = RefundRepository::new(ctx.state.pool()).list().await?;
    Ok(RefundsTemplate {
        current_path: "/admin/refunds",
        refunds: refunds.iter().map(AdminRefundRow::from).collect(),
        layout: ctx.layout().await,
    })
}

/// Accept or reject the ticked refund requests.
#[instrument(skip(ctx, staff, body), fields(staff_id = %staff.0.id))]
pub async fn refund_actions(
    ctx: PageContext,
    staff: RequireStaff,
    body: Bytes,
) -> Result<Response> {
    if let Some(bulk) = parse_bulk::<RefundAction>(&ctx, &body).await {
        let n = RefundRepository::new(ctx.state.pool())
            .apply_action(bulk.action, &bulk.ids)
            .await?;
        tracing::info!(action = ?bulk.action, changed = n, "Refund action applied");
        ctx.flash(FlashLevel::Success, refund_message(bulk.action, n))
            .await;
    }
    Ok(Redirect::to("/admin/refunds").into_response())
}

// =============================================================================
// Coupon Routes
// =============================================================================

/// Coupons plus the create form.
#[instrument(skip(ctx, staff), fields(staff_id = %staff.0.id))]
pub async fn coupons(ctx: PageContext, staff: RequireStaff) -> Result<Response> {
    render_coupons(&ctx, CouponCreateForm::default(), FieldErrors::new()).await
}

/// Create a coupon valid from now.
#[instrument(skip(ctx, staff, form), fields(staff_id = %staff.0.id))]
pub async fn create_coupon(
    ctx: PageContext,
    staff: RequireStaff,
    Form(form): Form<CouponCreateForm>,
) -> Result<Response> {
    let coupon = match form.validate(Utc::now()) {
        Ok(coupon) => coupon,
        Err(errors) => return render_coupons(&ctx, form, errors).await,
    };

    match CouponRepository::new(ctx.state.pool())
        .create(&coupon.code, coupon.amount, coupon.valid_from, coupon.valid_to)
        .await
    {
        Ok(created) => {
            tracing::info!(coupon_id = %created.id, "Coupon created");
            ctx.flash(
                FlashLevel::Success,
                format!("Coupon {} created.", created.code),
            )
            .await;
            Ok(Redirect::to("/admin/coupons").into_response())
        }
        Err(RepositoryError::Conflict(_)) => {
            let mut errors = FieldErrors::new();
            errors.add("code", "Coupon with this Code already exists.");
            render_coupons(&ctx, form, errors).await
        }
        Err(err) => Err(err.into()),
    }
}

/// Activate or deactivate the ticked coupons.
#[instrument(skip(ctx, staff, body), fields(staff_id = %staff.0.id))]
pub async fn coupon_actions(
    ctx: PageContext,
    staff: RequireStaff,
    body: Bytes,
) -> Result<Response> {
    if let Some(bulk) = parse_bulk::<CouponAction>(&ctx, &body).await {
        let n = CouponRepository::new(ctx.state.pool())
            .apply_action(bulk.action, &bulk.ids)
            .await?;
        ctx.flash(FlashLevel::Success, coupon_message(bulk.action, n))
            .await;
    }
    Ok(Redirect::to("/admin/coupons").into_response())
}

// =============================================================================
// Payment Routes
// =============================================================================

/// Captured charges. Read only.
#[instrument(skip(ctx, staff), fields(staff_id = %staff.0.id))]
pub async fn payments(ctx: PageContext, staff: RequireStaff) -> Result<impl IntoResponse> {
    let payments = PaymentRepository::new(ctx.state.pool()).list().await?;
    Ok(PaymentsTemplate {
        current_path: "/admin/payments",
        payments: payments.iter().map(AdminPaymentRow::from).collect(),
        layout: ctx.layout().await,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use bookbazar_core::Money;

    use super::*;

    fn coupon(active: bool, from_days: i64, to_days: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: CouponId::new(1),
            code: "SAVE10".to_owned(),
            amount: Money::from_cents(1000),
            valid_from: now + Duration::days(from_days),
            valid_to: now + Duration::days(to_days),
            active,
        }
    }

    #[test]
    fn test_order_filter_from_query() {
        let query = OrderQuery {
            q: None,
            status: Some("refund_requested".to_owned()),
        };
        assert_eq!(query.filter(), Some(OrderFilter::RefundRequested));

        let query = OrderQuery {
            q: None,
            status: Some("shipped".to_owned()),
        };
        assert_eq!(query.filter(), None);
    }

    #[test]
    fn test_coupon_row_state() {
        let now = Utc::now();
        assert_eq!(AdminCouponRow::new(&coupon(true, -1, 5), now).state, "Valid");
        assert_eq!(AdminCouponRow::new(&coupon(true, -10, -1), now).state, "Expired");
        assert_eq!(AdminCouponRow::new(&coupon(true, 2, 5), now).state, "Scheduled");
        assert_eq!(AdminCouponRow::new(&coupon(false, -1, 5), now).state, "Inactive");
    }

    #[test]
    fn test_action_messages() {
        assert_eq!(
            order_message(OrderAction::GrantRefunds, 2),
            "2 orders granted refunds."
        );
        assert_eq!(
            refund_message(RefundAction::AcceptRefunds, 1),
            "1 refund requests accepted."
        );
        assert_eq!(
            coupon_message(CouponAction::Deactivate, 3),
            "3 coupons deactivated."
        );
    }
}
