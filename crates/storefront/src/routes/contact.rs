//! Contact form route handlers.
//!
//! Messages are mailed to the store inbox over SMTP.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::filters;
use crate::forms::{ContactForm, FieldErrors};
use crate::middleware::{Layout, PageContext};
use crate::models::FlashLevel;

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub layout: Layout,
    pub form: ContactForm,
    pub errors: FieldErrors,
}

/// Display the contact form, pre-filling a signed-in user's email.
#[instrument(skip(ctx))]
pub async fn contact_page(ctx: PageContext) -> impl IntoResponse {
    let form = ContactForm {
        email: ctx
            .user
            .as_ref()
            .map(|u| u.email.to_string())
            .unwrap_or_default(),
        ..ContactForm::default()
    };
    ContactTemplate {
        form,
        errors: FieldErrors::new(),
        layout: ctx.layout().await,
    }
}

/// Send a contact message.
#[instrument(skip(ctx, form))]
pub async fn contact(ctx: PageContext, Form(form): Form<ContactForm>) -> Response {
    let message = match form.validate() {
        Ok(message) => message,
        Err(errors) => {
            return ContactTemplate {
                form,
                errors,
                layout: ctx.layout().await,
            }
            .into_response();
        }
    };

    match ctx.state.email().send_contact(&message).await {
        Ok(()) => {
            tracing::info!(subject = %message.subject, "Contact message sent");
            ctx.flash(FlashLevel::Success, "Your message has been sent successfully!")
                .await;
            Redirect::to("/contact").into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to send contact message");
            ctx.flash(FlashLevel::Error, "There was an error sending your message.")
                .await;
            ContactTemplate {
                form,
                errors: FieldErrors::new(),
                layout: ctx.layout().await,
            }
            .into_response()
        }
    }
}
