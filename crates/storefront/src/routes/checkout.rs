//! Checkout, coupon and payment route handlers.
//!
//! Checkout picks the shipping and billing addresses for the open order;
//! the payment page charges it through Stripe. Every recoverable problem is
//! flashed and redirected, mirroring the cart handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tracing::instrument;

use bookbazar_core::{AddressType, PaymentOption, UserId};

use crate::db::addresses::AddressRepository;
use crate::db::orders::OrderRepository;
use crate::db::profiles::ProfileRepository;
use crate::error::Result;
use crate::filters;
use crate::forms::{
    FieldErrors,
    checkout::{BillingChoice, CheckoutForm, CouponForm, PaymentForm, ShippingChoice},
};
use crate::middleware::{Layout, PageContext, RequireAuth};
use crate::models::{Address, CurrentUser, FlashLevel, OrderLine};
use crate::services::checkout::{CheckoutError, CheckoutService, OrderSnapshot, PaidOrder};
use crate::services::stripe::SavedCard;

// =============================================================================
// View Types
// =============================================================================

/// One line of the order being checked out.
#[derive(Clone)]
pub struct OrderLineView {
    pub slug: String,
    pub title: String,
    pub quantity: i32,
    pub line_final: String,
}

impl From<&OrderLine> for OrderLineView {
    fn from(line: &OrderLine) -> Self {
        Self {
            slug: line.slug.clone(),
            title: line.title.clone(),
            quantity: line.quantity,
            line_final: line.priced().line_final().to_string(),
        }
    }
}

/// Compact order summary shown beside the checkout and payment forms.
#[derive(Clone)]
pub struct CheckoutSummaryView {
    pub lines: Vec<OrderLineView>,
    pub coupon_code: Option<String>,
    pub coupon_amount: Option<String>,
    pub total: String,
}

impl From<&OrderSnapshot> for CheckoutSummaryView {
    fn from(snapshot: &OrderSnapshot) -> Self {
        Self {
            lines: snapshot.lines.iter().map(OrderLineView::from).collect(),
            coupon_code: snapshot.coupon.as_ref().map(|c| c.code.clone()),
            coupon_amount: snapshot.coupon.as_ref().map(|c| c.amount.to_string()),
            total: snapshot.total.to_string(),
        }
    }
}

/// A payment option radio button.
#[derive(Clone)]
pub struct PaymentOptionView {
    pub code: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

/// A saved card offered on the payment page.
#[derive(Clone)]
pub struct CardView {
    pub brand: String,
    pub last4: String,
    pub expires: String,
}

impl From<&SavedCard> for CardView {
    fn from(card: &SavedCard) -> Self {
        Self {
            brand: card.brand.clone(),
            last4: card.last4.clone(),
            expires: format!("{:02}/{}", card.exp_month, card.exp_year),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout form page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/checkout.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub form: CheckoutForm,
    pub errors: FieldErrors,
    pub summary: CheckoutSummaryView,
    pub payment_options: Vec<PaymentOptionView>,
    pub default_shipping: Option<String>,
    pub default_billing: Option<String>,
}

/// Stripe card payment page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment_stripe.html")]
pub struct StripePaymentTemplate {
    pub layout: Layout,
    pub summary: CheckoutSummaryView,
    pub publishable_key: String,
    /// The customer's default card, if one-click purchasing is on.
    pub default_card: Option<CardView>,
    pub other_cards: Vec<CardView>,
}

/// PayPal placeholder page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment_paypal.html")]
pub struct PaypalPaymentTemplate {
    pub layout: Layout,
}

// =============================================================================
// Helpers
// =============================================================================

fn payment_options(selected: Option<&str>) -> Vec<PaymentOptionView> {
    PaymentOption::ALL
        .iter()
        .map(|option| PaymentOptionView {
            code: option.as_str(),
            label: option.label(),
            checked: selected.is_some_and(|s| s == option.as_str()),
        })
        .collect()
}

/// Render the checkout form around a snapshot.
async fn render_checkout(
    ctx: &PageContext,
    user: UserId,
    snapshot: &OrderSnapshot,
    form: CheckoutForm,
    errors: FieldErrors,
) -> Result<Response> {
    let addresses = AddressRepository::new(ctx.state.pool());
    let default_shipping = addresses.default_for(user, AddressType::Shipping).await?;
    let default_billing = addresses.default_for(user, AddressType::Billing).await?;

    Ok(CheckoutTemplate {
        payment_options: payment_options(form.payment_option.as_deref()),
        form,
        errors,
        summary: CheckoutSummaryView::from(snapshot),
        default_shipping: default_shipping.as_ref().map(Address::one_line),
        default_billing: default_billing.as_ref().map(Address::one_line),
        layout: ctx.layout().await,
    }
    .into_response())
}

/// Flash a checkout error and redirect, or surface it as an error page.
async fn flash_and_redirect(ctx: &PageContext, err: CheckoutError, to: &str) -> Result<Response> {
    match err.flash() {
        Some((level, message)) => {
            ctx.flash(level, message).await;
            Ok(Redirect::to(to).into_response())
        }
        None => Err(err.into()),
    }
}

/// Send the order confirmation if the shopper wants order updates.
async fn send_confirmation(ctx: &PageContext, user: &CurrentUser, paid: &PaidOrder) {
    let email = ctx.state.email();
    if !email.is_enabled() {
        return;
    }
    let profile = match ProfileRepository::new(ctx.state.pool())
        .get_or_create(user.id)
        .await
    {
        Ok(profile) => profile,
        Err(err) => {
            tracing::warn!(error = %err, "Could not load profile for order confirmation");
            return;
        }
    };
    if !profile.order_updates {
        return;
    }
    let name = profile.display_name(&user.email);
    if let Err(err) = email.send_order_confirmation(&user.email, &name, paid).await {
        tracing::warn!(ref_code = %paid.ref_code, error = %err, "Order confirmation not sent");
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Checkout form.
#[instrument(skip(ctx, user), fields(user_id = %user.id))]
pub async fn checkout_page(ctx: PageContext, RequireAuth(user): RequireAuth) -> Result<Response> {
    let snapshot = match CheckoutService::new(ctx.state.pool()).snapshot(user.id).await {
        Ok(snapshot) => snapshot,
        Err(err) => return flash_and_redirect(&ctx, err, "/order-summary").await,
    };
    render_checkout(&ctx, user.id, &snapshot, CheckoutForm::default(), FieldErrors::new()).await
}

/// Attach addresses to the open order and move on to payment.
#[instrument(skip(ctx, user, form), fields(user_id = %user.id))]
pub async fn checkout(
    ctx: PageContext,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let pool = ctx.state.pool();
    let snapshot = match CheckoutService::new(pool).snapshot(user.id).await {
        Ok(snapshot) => snapshot,
        Err(err) => return flash_and_redirect(&ctx, err, "/order-summary").await,
    };

    let plan = match form.validate() {
        Ok(plan) => plan,
        Err(errors) => {
            ctx.flash(FlashLevel::Warning, "Please correct the errors below.")
                .await;
            return render_checkout(&ctx, user.id, &snapshot, form, errors).await;
        }
    };

    let addresses = AddressRepository::new(pool);
    let shipping = match plan.shipping {
        ShippingChoice::UseDefault => {
            match addresses.default_for(user.id, AddressType::Shipping).await? {
                Some(address) => address,
                None => {
                    ctx.flash(FlashLevel::Info, "No default shipping address available")
                        .await;
                    return Ok(Redirect::to("/checkout").into_response());
                }
            }
        }
        ShippingChoice::New(address) => addresses.create(user.id, &address).await?,
    };

    let billing = match plan.billing {
        BillingChoice::SameAsShipping => {
            addresses
                .create(user.id, &shipping.as_new(AddressType::Billing))
                .await?
        }
        BillingChoice::UseDefault => {
            match addresses.default_for(user.id, AddressType::Billing).await? {
                Some(address) => address,
                None => {
                    ctx.flash(FlashLevel::Info, "No default billing address available")
                        .await;
                    return Ok(Redirect::to("/checkout").into_response());
                }
            }
        }
        BillingChoice::New(address) => addresses.create(user.id, &address).await?,
    };

    OrderRepository::new(pool)
        .set_addresses(snapshot.order.id, shipping.id, billing.id)
        .await?;
    tracing::info!(
        order_id = %snapshot.order.id,
        payment_option = plan.payment_option.as_str(),
        "Checkout addresses set"
    );

    Ok(Redirect::to(&format!("/payment/{}", plan.payment_option.path_segment())).into_response())
}

/// Apply a promo code to the open order.
#[instrument(skip(ctx, user, form), fields(user_id = %user.id))]
pub async fn add_coupon(
    ctx: PageContext,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    let service = CheckoutService::new(ctx.state.pool());
    match service.apply_coupon(user.id, &form.code, Utc::now()).await {
        Ok(_) => {
            ctx.flash(FlashLevel::Success, "Coupon applied successfully!")
                .await;
            Ok(Redirect::to("/order-summary").into_response())
        }
        Err(err) => {
            tracing::info!(error = %err, "Coupon rejected");
            flash_and_redirect(&ctx, err, "/order-summary").await
        }
    }
}

/// Stripe payment page.
#[instrument(skip(ctx, user), fields(user_id = %user.id))]
pub async fn stripe_page(ctx: PageContext, RequireAuth(user): RequireAuth) -> Result<Response> {
    let service = CheckoutService::new(ctx.state.pool());
    let snapshot = match service.snapshot(user.id).await {
        Ok(snapshot) => snapshot,
        Err(err) => return flash_and_redirect(&ctx, err, "/order-summary").await,
    };
    if snapshot.order.billing_address_id.is_none() {
        return flash_and_redirect(&ctx, CheckoutError::NoBillingAddress, "/checkout").await;
    }

    let mut cards = service
        .saved_cards(ctx.state.stripe(), user.id)
        .await?
        .iter()
        .map(CardView::from)
        .collect::<Vec<_>>();
    let default_card = (!cards.is_empty()).then(|| cards.remove(0));

    Ok(StripePaymentTemplate {
        summary: CheckoutSummaryView::from(&snapshot),
        publishable_key: ctx.state.config().stripe.publishable_key.clone(),
        default_card,
        other_cards: cards,
        layout: ctx.layout().await,
    }
    .into_response())
}

/// Charge the open order.
#[instrument(skip(ctx, user, form), fields(user_id = %user.id))]
pub async fn stripe_pay(
    ctx: PageContext,
    RequireAuth(user): RequireAuth,
    Form(form): Form<PaymentForm>,
) -> Result<Response> {
    let Some(instruction) = form.validate() else {
        let err = CheckoutError::InvalidPaymentData;
        let to = err.payment_redirect();
        return flash_and_redirect(&ctx, err, to).await;
    };

    let paid = match CheckoutService::new(ctx.state.pool())
        .pay(
            ctx.state.stripe(),
            user.id,
            &user.email,
            &instruction,
            Utc::now(),
        )
        .await
    {
        Ok(paid) => paid,
        Err(err) => {
            tracing::warn!(error = %err, "Payment failed");
            let to = err.payment_redirect();
            return flash_and_redirect(&ctx, err, to).await;
        }
    };

    if let Some(code) = &paid.dropped_coupon {
        ctx.flash(
            FlashLevel::Warning,
            format!("Coupon {code} is no longer valid and was removed from your order."),
        )
        .await;
    }
    send_confirmation(&ctx, &user, &paid).await;

    ctx.flash(FlashLevel::Success, "Your order was successful!")
        .await;
    Ok(Redirect::to("/").into_response())
}

/// PayPal is not offered yet.
#[instrument(skip(ctx, _user))]
pub async fn paypal_page(ctx: PageContext, _user: RequireAuth) -> impl IntoResponse {
    PaypalPaymentTemplate {
        layout: ctx.layout().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_options_mark_selection() {
        let options = payment_options(Some("P"));
        assert_eq!(options.len(), 2);
        assert!(!options[0].checked);
        assert!(options[1].checked);
        assert_eq!(options[1].label, "PayPal");
        assert!(payment_options(None).iter().all(|o| !o.checked));
    }

    #[test]
    fn test_card_view_pads_month() {
        let card = SavedCard {
            id: "card_1".to_owned(),
            brand: "Visa".to_owned(),
            last4: "4242".to_owned(),
            exp_month: 4,
            exp_year: 2030,
        };
        assert_eq!(CardView::from(&card).expires, "04/2030");
    }
}
