//! Authentication route handlers.
//!
//! Email and password accounts stored in the storefront database. The
//! session holds a [`CurrentUser`] once signed in.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::Query,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::forms::{FieldErrors, LoginForm, RegisterForm};
use crate::middleware::{Layout, PageContext, clear_current_user, safe_next, set_current_user};
use crate::models::{CurrentUser, FlashLevel};
use crate::services::auth::{AuthError, AuthService};

// =============================================================================
// Query Types
// =============================================================================

/// `?next=` carried from a login-required page.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub next: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub email: String,
    pub errors: FieldErrors,
}

// =============================================================================
// Helpers
// =============================================================================

/// Store the user in the session and tag error reports with them.
async fn sign_in(ctx: &PageContext, user: &CurrentUser) -> Result<()> {
    set_current_user(&ctx.session, user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
#[instrument(skip(ctx))]
pub async fn login_page(ctx: PageContext, Query(query): Query<NextQuery>) -> Response {
    if ctx.user.is_some() {
        return Redirect::to(safe_next(query.next.as_deref())).into_response();
    }
    LoginTemplate {
        email: String::new(),
        next: safe_next(query.next.as_deref()).to_owned(),
        layout: ctx.layout().await,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(ctx, form))]
pub async fn login(ctx: PageContext, Form(form): Form<LoginForm>) -> Result<Response> {
    let next = safe_next(form.next.as_deref()).to_owned();

    match AuthService::new(ctx.state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            let current = CurrentUser::from(&user);
            sign_in(&ctx, &current).await?;
            tracing::info!(user_id = %user.id, "User logged in");
            ctx.flash(FlashLevel::Success, format!("Welcome back, {}!", user.email))
                .await;
            Ok(Redirect::to(&next).into_response())
        }
        Err(AuthError::InvalidCredentials | AuthError::Inactive) => {
            tracing::info!("Login rejected");
            ctx.flash(FlashLevel::Error, "Invalid email or password.")
                .await;
            Ok(LoginTemplate {
                email: form.email,
                next,
                layout: ctx.layout().await,
            }
            .into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// Sign out.
#[instrument(skip(ctx))]
pub async fn logout(ctx: PageContext) -> Result<Response> {
    clear_current_user(&ctx.session).await?;
    clear_sentry_user();
    ctx.flash(FlashLevel::Info, "You have been logged out.")
        .await;
    Ok(Redirect::to("/").into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(ctx))]
pub async fn register_page(ctx: PageContext) -> Response {
    if ctx.user.is_some() {
        return Redirect::to("/").into_response();
    }
    RegisterTemplate {
        email: String::new(),
        errors: FieldErrors::new(),
        layout: ctx.layout().await,
    }
    .into_response()
}

/// Handle registration form submission.
///
/// The user, their profile and cart are created together; the new account
/// is signed in straight away.
#[instrument(skip(ctx, form))]
pub async fn register(ctx: PageContext, Form(form): Form<RegisterForm>) -> Result<Response> {
    if ctx.user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let rerender = |ctx: PageContext, email: String, errors: FieldErrors| async move {
        RegisterTemplate {
            email,
            errors,
            layout: ctx.layout().await,
        }
        .into_response()
    };

    let email = match form.validate() {
        Ok(email) => email,
        Err(errors) => return Ok(rerender(ctx, form.email, errors).await),
    };

    match AuthService::new(ctx.state.pool())
        .register(&email, &form.password1)
        .await
    {
        Ok(user) => {
            sign_in(&ctx, &CurrentUser::from(&user)).await?;
            ctx.flash(
                FlashLevel::Success,
                format!(
                    "Welcome {}! Your account has been created successfully.",
                    user.email
                ),
            )
            .await;
            Ok(Redirect::to("/").into_response())
        }
        Err(AuthError::UserAlreadyExists) => {
            let mut errors = FieldErrors::new();
            errors.add("email", "A user with this email already exists.");
            Ok(rerender(ctx, form.email, errors).await)
        }
        Err(AuthError::WeakPassword(message)) => {
            let mut errors = FieldErrors::new();
            errors.add("password1", message);
            Ok(rerender(ctx, form.email, errors).await)
        }
        Err(err) => Err(err.into()),
    }
}
