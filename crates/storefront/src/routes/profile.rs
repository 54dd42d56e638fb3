//! Profile and password route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::Multipart,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tracing::instrument;

use bookbazar_core::{DisplayCurrency, Language};

use crate::db::profiles::ProfileRepository;
use crate::error::Result;
use crate::filters;
use crate::forms::{FieldErrors, PasswordChangeForm, ProfileForm};
use crate::middleware::{Layout, PageContext, RequireAuth};
use crate::models::{FlashLevel, Profile, User};
use crate::routes::upload::read_multipart;
use crate::routes::views::{ChoiceView, choice_options};
use crate::services::auth::{AuthError, AuthService};
use crate::services::uploads::{MediaKind, validate_image};

// =============================================================================
// View Types
// =============================================================================

/// The profile page.
pub struct ProfileView {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birthdate: Option<String>,
    pub photo_url: Option<String>,
    pub newsletter: bool,
    pub order_updates: bool,
    pub promotions: bool,
    pub language: &'static str,
    pub currency: &'static str,
    pub favorite_genres: String,
    pub one_click: bool,
    pub member_since: String,
}

impl ProfileView {
    fn new(user: &User, profile: Profile) -> Self {
        Self {
            full_name: profile.full_name(&user.email),
            email: user.email.to_string(),
            birthdate: profile
                .birthdate
                .map(|d| d.format("%B %-d, %Y").to_string()),
            one_click: profile.one_click_customer().is_some(),
            language: profile.language.label(),
            currency: profile.currency.label(),
            member_since: user.date_joined.format("%B %Y").to_string(),
            phone: profile.phone,
            photo_url: profile.profile_photo,
            newsletter: profile.newsletter,
            order_updates: profile.order_updates,
            promotions: profile.promotions,
            favorite_genres: profile.favorite_genres,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "profile/show.html")]
pub struct ProfileTemplate {
    pub layout: Layout,
    pub profile: ProfileView,
}

#[derive(Template, WebTemplate)]
#[template(path = "profile/edit.html")]
pub struct ProfileEditTemplate {
    pub layout: Layout,
    pub form: ProfileForm,
    pub errors: FieldErrors,
    pub photo_url: Option<String>,
    pub languages: Vec<ChoiceView>,
    pub currencies: Vec<ChoiceView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "profile/change_password.html")]
pub struct ChangePasswordTemplate {
    pub layout: Layout,
    pub errors: FieldErrors,
}

// =============================================================================
// Helpers
// =============================================================================

async fn render_edit(
    ctx: &PageContext,
    form: ProfileForm,
    errors: FieldErrors,
    photo_url: Option<String>,
) -> Response {
    ProfileEditTemplate {
        languages: choice_options(
            Language::ALL.iter().map(|l| (l.as_str(), l.label())),
            &form.language,
        ),
        currencies: choice_options(
            DisplayCurrency::ALL.iter().map(|c| (c.as_str(), c.label())),
            &form.currency,
        ),
        form,
        errors,
        photo_url,
        layout: ctx.layout().await,
    }
    .into_response()
}

// =============================================================================
// Routes
// =============================================================================

/// The signed-in user's profile.
#[instrument(skip(ctx, user), fields(user_id = %user.id))]
pub async fn show(ctx: PageContext, RequireAuth(user): RequireAuth) -> Result<impl IntoResponse> {
    let pool = ctx.state.pool();
    let account = AuthService::new(pool).get_user(user.id).await?;
    let profile = ProfileRepository::new(pool).get_or_create(user.id).await?;

    Ok(ProfileTemplate {
        profile: ProfileView::new(&account, profile),
        layout: ctx.layout().await,
    })
}

/// Profile edit form.
#[instrument(skip(ctx, user), fields(user_id = %user.id))]
pub async fn edit_page(ctx: PageContext, RequireAuth(user): RequireAuth) -> Result<Response> {
    let profile = ProfileRepository::new(ctx.state.pool())
        .get_or_create(user.id)
        .await?;
    let form = ProfileForm::from_profile(&profile);
    Ok(render_edit(&ctx, form, FieldErrors::new(), profile.profile_photo).await)
}

/// Save the profile, replacing or removing the photo as asked.
#[instrument(skip(ctx, user, multipart), fields(user_id = %user.id))]
pub async fn edit(
    ctx: PageContext,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> Result<Response> {
    let mut form = ProfileForm::default();
    let photo = read_multipart(multipart, |name, value| form.set(name, value))
        .await?
        .take("profile_photo");

    let profiles = ProfileRepository::new(ctx.state.pool());
    let current = profiles.get_or_create(user.id).await?;

    let (update, mut errors) = match form.validate(Utc::now().date_naive()) {
        Ok(update) => (Some(update), FieldErrors::new()),
        Err(errors) => (None, errors),
    };
    if let Some(photo) = &photo
        && let Err(err) = validate_image(&photo.filename, photo.bytes.len())
    {
        errors.add("profile_photo", err.to_string());
    }
    let Some(update) = update.filter(|_| errors.is_empty()) else {
        ctx.flash(FlashLevel::Error, "Please correct the errors below.")
            .await;
        return Ok(render_edit(&ctx, form, errors, current.profile_photo).await);
    };

    profiles.update(user.id, &update).await?;

    let media = ctx.state.media();
    if let Some(photo) = photo {
        let path = media
            .save_image(MediaKind::ProfilePhoto, &photo.filename, &photo.bytes)
            .await?;
        profiles.set_photo(user.id, Some(&path)).await?;
        if let Some(old) = &current.profile_photo {
            media.remove(old).await;
        }
    } else if form.remove_photo()
        && let Some(old) = &current.profile_photo
    {
        profiles.set_photo(user.id, None).await?;
        media.remove(old).await;
    }

    tracing::info!("Profile updated");
    ctx.flash(FlashLevel::Success, "Profile updated successfully!")
        .await;
    Ok(Redirect::to("/users/profile").into_response())
}

/// Password change form.
#[instrument(skip(ctx, _user))]
pub async fn change_password_page(ctx: PageContext, _user: RequireAuth) -> impl IntoResponse {
    ChangePasswordTemplate {
        errors: FieldErrors::new(),
        layout: ctx.layout().await,
    }
}

/// Check the current password and store the new one.
#[instrument(skip(ctx, user, form), fields(user_id = %user.id))]
pub async fn change_password(
    ctx: PageContext,
    RequireAuth(user): RequireAuth,
    Form(form): Form<PasswordChangeForm>,
) -> Result<Response> {
    let errors = match form.validate() {
        Ok(()) => {
            match AuthService::new(ctx.state.pool())
                .change_password(user.id, &form.old_password, &form.new_password1)
                .await
            {
                Ok(()) => {
                    ctx.flash(FlashLevel::Success, "Your password was updated.")
                        .await;
                    return Ok(Redirect::to("/users/profile").into_response());
                }
                Err(AuthError::InvalidCredentials) => {
                    let mut errors = FieldErrors::new();
                    errors.add(
                        "old_password",
                        "Your old password was entered incorrectly. Please enter it again.",
                    );
                    errors
                }
                Err(AuthError::WeakPassword(message)) => {
                    let mut errors = FieldErrors::new();
                    errors.add("new_password1", message);
                    errors
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(errors) => errors,
    };

    Ok(ChangePasswordTemplate {
        errors,
        layout: ctx.layout().await,
    }
    .into_response())
}
