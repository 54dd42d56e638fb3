//! Account route handlers: saved addresses, order history and refunds.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::Path,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use bookbazar_core::{AddressId, AddressType, UserId};

use crate::db::RepositoryError;
use crate::db::addresses::AddressRepository;
use crate::db::coupons::CouponRepository;
use crate::db::orders::{OrderOverview, OrderRepository};
use crate::db::payments::PaymentRepository;
use crate::db::refunds::RefundRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::{AddressForm, FieldErrors, RefundForm};
use crate::middleware::{Layout, PageContext, RequireAuth};
use crate::models::{Address, FlashLevel, Order};
use crate::routes::checkout::OrderLineView;
use crate::routes::views::{ChoiceView, choice_options};

// =============================================================================
// View Types
// =============================================================================

/// A saved address.
#[derive(Clone)]
pub struct AddressView {
    pub id: AddressId,
    pub line: String,
    pub kind: &'static str,
    pub is_default: bool,
}

impl From<&Address> for AddressView {
    fn from(address: &Address) -> Self {
        Self {
            id: address.id,
            line: address.one_line(),
            kind: address.address_type.label(),
            is_default: address.is_default,
        }
    }
}

/// One row of the order history.
#[derive(Clone)]
pub struct OrderRowView {
    pub ref_code: String,
    pub date: String,
    pub status: &'static str,
    pub total: String,
}

impl From<&OrderOverview> for OrderRowView {
    fn from(overview: &OrderOverview) -> Self {
        Self {
            ref_code: overview.order.ref_code.clone().unwrap_or_default(),
            date: ordered_date(&overview.order),
            status: overview.order.status().label(),
            total: overview.total.to_string(),
        }
    }
}

fn ordered_date(order: &Order) -> String {
    order
        .ordered_date
        .map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}

// =============================================================================
// Templates
// =============================================================================

/// Account page: addresses plus the add-address form.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountTemplate {
    pub layout: Layout,
    pub addresses: Vec<AddressView>,
    pub form: AddressForm,
    pub errors: FieldErrors,
    pub address_types: Vec<ChoiceView>,
}

/// Order history.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderRowView>,
}

/// One paid order.
#[derive(Template, WebTemplate)]
#[template(path = "account/order_detail.html")]
pub struct OrderDetailTemplate {
    pub layout: Layout,
    pub order: OrderRowView,
    pub lines: Vec<OrderLineView>,
    pub shipping: Option<String>,
    pub billing: Option<String>,
    pub coupon: Option<String>,
    pub charge_id: Option<String>,
    pub refundable: bool,
}

/// Refund request form.
#[derive(Template, WebTemplate)]
#[template(path = "account/refund.html")]
pub struct RefundTemplate {
    pub layout: Layout,
    pub ref_code: String,
    pub form: RefundForm,
    pub errors: FieldErrors,
}

// =============================================================================
// Helpers
// =============================================================================

async fn render_account(
    ctx: &PageContext,
    user: UserId,
    form: AddressForm,
    errors: FieldErrors,
) -> Result<Response> {
    let addresses = AddressRepository::new(ctx.state.pool())
        .list_for_user(user)
        .await?;
    Ok(AccountTemplate {
        addresses: addresses.iter().map(AddressView::from).collect(),
        address_types: choice_options(
            AddressType::ALL.iter().map(|t| (t.as_str(), t.label())),
            &form.address_type,
        ),
        form,
        errors,
        layout: ctx.layout().await,
    }
    .into_response())
}

/// A paid order of the user's, or 404.
async fn own_order(ctx: &PageContext, user: UserId, ref_code: &str) -> Result<OrderOverview> {
    OrderRepository::new(ctx.state.pool())
        .get_by_ref(user, ref_code)
        .await?
        .filter(|o| o.order.ordered)
        .ok_or_else(|| AppError::NotFound(format!("order {ref_code}")))
}

// =============================================================================
// Address Routes
// =============================================================================

/// Addresses and the add-address form.
#[instrument(skip(ctx, user), fields(user_id = %user.id))]
pub async fn index(ctx: PageContext, RequireAuth(user): RequireAuth) -> Result<Response> {
    render_account(&ctx, user.id, AddressForm::default(), FieldErrors::new()).await
}

/// Save a new address.
#[instrument(skip(ctx, user, form), fields(user_id = %user.id))]
pub async fn add_address(
    ctx: PageContext,
    RequireAuth(user): RequireAuth,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    match form.validate() {
        Ok(address) => {
            AddressRepository::new(ctx.state.pool())
                .create(user.id, &address)
                .await?;
            ctx.flash(FlashLevel::Success, "Address added successfully!")
                .await;
            Ok(Redirect::to("/account").into_response())
        }
        Err(errors) => render_account(&ctx, user.id, form, errors).await,
    }
}

/// Make one of the user's addresses the default for its type.
#[instrument(skip(ctx, user), fields(user_id = %user.id))]
pub async fn set_default_address(
    ctx: PageContext,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    AddressRepository::new(ctx.state.pool())
        .set_default(user.id, AddressId::new(id))
        .await?;
    ctx.flash(FlashLevel::Success, "Default address updated.")
        .await;
    Ok(Redirect::to("/account").into_response())
}

/// Delete one of the user's addresses.
#[instrument(skip(ctx, user), fields(user_id = %user.id))]
pub async fn delete_address(
    ctx: PageContext,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    AddressRepository::new(ctx.state.pool())
        .delete(user.id, AddressId::new(id))
        .await?;
    ctx.flash(FlashLevel::Info, "Address deleted.").await;
    Ok(Redirect::to("/account").into_response())
}

// =============================================================================
// Order Routes
// =============================================================================

/// The user's paid orders, newest first.
#[instrument(skip(ctx, user), fields(user_id = %user.id))]
pub async fn orders(ctx: PageContext, RequireAuth(user): RequireAuth) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(ctx.state.pool())
        .paid_orders(user.id)
        .await?;
    Ok(OrdersTemplate {
        orders: orders.iter().map(OrderRowView::from).collect(),
        layout: ctx.layout().await,
    })
}

/// Order detail. Other users' orders are 404.
#[instrument(skip(ctx, user), fields(user_id = %user.id))]
pub async fn order_detail(
    ctx: PageContext,
    RequireAuth(user): RequireAuth,
    Path(ref_code): Path<String>,
) -> Result<impl IntoResponse> {
    let overview = own_order(&ctx, user.id, &ref_code).await?;
    let order = &overview.order;
    let pool = ctx.state.pool();

    let lines = OrderRepository::new(pool).lines(order.id).await?;
    let addresses = AddressRepository::new(pool);
    let shipping = match order.shipping_address_id {
        Some(id) => addresses.get(id).await?.map(|a| a.one_line()),
        None => None,
    };
    let billing = match order.billing_address_id {
        Some(id) => addresses.get(id).await?.map(|a| a.one_line()),
        None => None,
    };
    let coupon = match order.coupon_id {
        Some(id) => CouponRepository::new(pool)
            .get(id)
            .await?
            .map(|c| format!("{} (-{})", c.code, c.amount)),
        None => None,
    };
    let charge_id = match order.payment_id {
        Some(id) => PaymentRepository::new(pool)
            .get(id)
            .await?
            .map(|p| p.stripe_charge_id),
        None => None,
    };

    Ok(OrderDetailTemplate {
        refundable: order.status().refundable(),
        order: OrderRowView::from(&overview),
        lines: lines.iter().map(OrderLineView::from).collect(),
        shipping,
        billing,
        coupon,
        charge_id,
        layout: ctx.layout().await,
    })
}

// =============================================================================
// Refund Routes
// =============================================================================

/// Refund request form for a paid order.
#[instrument(skip(ctx, user), fields(user_id = %user.id))]
pub async fn refund_page(
    ctx: PageContext,
    RequireAuth(user): RequireAuth,
    Path(ref_code): Path<String>,
) -> Result<Response> {
    let overview = own_order(&ctx, user.id, &ref_code).await?;
    if !overview.order.status().refundable() {
        ctx.flash(
            FlashLevel::Info,
            "A refund has already been requested for this order.",
        )
        .await;
        return Ok(Redirect::to(&format!("/account/orders/{ref_code}")).into_response());
    }

    Ok(RefundTemplate {
        form: RefundForm {
            reason: String::new(),
            email: user.email.to_string(),
        },
        errors: FieldErrors::new(),
        ref_code,
        layout: ctx.layout().await,
    }
    .into_response())
}

/// File a refund request.
#[instrument(skip(ctx, user, form), fields(user_id = %user.id))]
pub async fn request_refund(
    ctx: PageContext,
    RequireAuth(user): RequireAuth,
    Path(ref_code): Path<String>,
    Form(form): Form<RefundForm>,
) -> Result<Response> {
    let overview = own_order(&ctx, user.id, &ref_code).await?;
    let detail = format!("/account/orders/{ref_code}");

    let (reason, email) = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            return Ok(RefundTemplate {
                form,
                errors,
                ref_code,
                layout: ctx.layout().await,
            }
            .into_response());
        }
    };

    match RefundRepository::new(ctx.state.pool())
        .request(overview.order.id, &reason, &email)
        .await
    {
        Ok(()) => {
            tracing::info!(order_id = %overview.order.id, "Refund requested");
            ctx.flash(FlashLevel::Success, "Your refund request was received.")
                .await;
        }
        Err(RepositoryError::Conflict(_)) => {
            ctx.flash(
                FlashLevel::Info,
                "A refund has already been requested for this order.",
            )
            .await;
        }
        Err(err) => return Err(err.into()),
    }
    Ok(Redirect::to(&detail).into_response())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use bookbazar_core::{Money, OrderId, OrderStatus};

    use super::*;

    fn paid_order() -> Order {
        Order {
            id: OrderId::new(3),
            user_id: UserId::new(1),
            ref_code: Some("abcdefghij0123456789".to_owned()),
            start_date: Utc::now(),
            ordered_date: Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).single(),
            ordered: true,
            shipping_address_id: None,
            billing_address_id: None,
            payment_id: None,
            coupon_id: None,
            being_delivered: true,
            received: false,
            refund_requested: false,
            refund_granted: false,
        }
    }

    #[test]
    fn test_order_row_view() {
        let row = OrderRowView::from(&OrderOverview {
            order: paid_order(),
            user_email: "reader@example.com".to_owned(),
            total: Money::from_cents(4250),
        });
        assert_eq!(row.date, "Mar 9, 2024");
        assert_eq!(row.status, OrderStatus::BeingDelivered.label());
        assert_eq!(row.total, "$42.50");
    }
}
