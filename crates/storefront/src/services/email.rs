//! Email service for contact messages and order confirmations.
//!
//! Uses SMTP via lettre with Askama text and HTML templates. Without an SMTP
//! host, contact mail is written to the log and confirmations are skipped.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use bookbazar_core::Email;

use crate::config::EmailConfig;
use crate::forms::account::ContactMessage;
use crate::services::checkout::PaidOrder;

#[derive(Template)]
#[template(path = "email/contact.html")]
struct ContactEmailHtml<'a> {
    message: &'a ContactMessage,
}

#[derive(Template)]
#[template(path = "email/contact.txt")]
struct ContactEmailText<'a> {
    message: &'a ContactMessage,
}

/// One row of the confirmation email.
struct ConfirmationLine {
    title: String,
    quantity: i32,
    line_total: String,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    name: &'a str,
    ref_code: &'a str,
    lines: &'a [ConfirmationLine],
    total: String,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    name: &'a str,
    ref_code: &'a str,
    lines: &'a [ConfirmationLine],
    total: String,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for transactional mail.
#[derive(Clone)]
pub struct EmailService {
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: String,
    contact_inbox: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let mailer = match &config.smtp {
            Some(smtp) => {
                let mut builder =
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?.port(smtp.port);
                if let (Some(username), Some(password)) = (&smtp.username, &smtp.password) {
                    builder = builder.credentials(Credentials::new(
                        username.clone(),
                        password.expose_secret().to_string(),
                    ));
                }
                Some(builder.build())
            }
            None => {
                tracing::warn!("SMTP_HOST not set; contact mail will be logged, not sent");
                None
            }
        };

        Ok(Self {
            mailer,
            from_address: config.from.clone(),
            contact_inbox: config.contact_inbox.clone(),
        })
    }

    /// Whether mail actually leaves the process.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.mailer.is_some()
    }

    /// Forward a contact form message to the store inbox.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_contact(&self, message: &ContactMessage) -> Result<(), EmailError> {
        let subject = contact_subject(&message.subject);
        let text = ContactEmailText { message }.render()?;

        if self.mailer.is_none() {
            tracing::info!(
                to = %self.contact_inbox,
                subject = %subject,
                body = %text,
                "Contact message (SMTP disabled)"
            );
            return Ok(());
        }

        let html = ContactEmailHtml { message }.render()?;
        let reply_to = parse_mailbox(message.email.as_str())?;
        self.send_multipart_email(&self.contact_inbox, Some(reply_to), &subject, &text, &html)
            .await
    }

    /// Send an order confirmation. Does nothing when SMTP is disabled.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_confirmation(
        &self,
        to: &Email,
        name: &str,
        order: &PaidOrder,
    ) -> Result<(), EmailError> {
        if self.mailer.is_none() {
            tracing::debug!(ref_code = %order.ref_code, "Order confirmation skipped (SMTP disabled)");
            return Ok(());
        }

        let lines: Vec<ConfirmationLine> = order
            .lines
            .iter()
            .map(|line| ConfirmationLine {
                title: line.title.clone(),
                quantity: line.quantity,
                line_total: line.priced().line_final().to_string(),
            })
            .collect();
        let total = order.total.to_string();

        let html = OrderConfirmationHtml {
            name,
            ref_code: &order.ref_code,
            lines: &lines,
            total: total.clone(),
        }
        .render()?;
        let text = OrderConfirmationText {
            name,
            ref_code: &order.ref_code,
            lines: &lines,
            total,
        }
        .render()?;

        let subject = format!("Your BookBazar order {}", order.ref_code);
        self.send_multipart_email(to.as_str(), None, &subject, &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        reply_to: Option<Mailbox>,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let Some(mailer) = &self.mailer else {
            return Ok(());
        };

        let mut builder = Message::builder()
            .from(parse_mailbox(&self.from_address)?)
            .to(parse_mailbox(to)?)
            .subject(subject);
        if let Some(reply_to) = reply_to {
            builder = builder.reply_to(reply_to);
        }

        let email = builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(text_body.to_string()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html_body.to_string()),
                ),
        )?;

        mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .parse()
        .map_err(|_| EmailError::InvalidAddress(address.to_string()))
}

/// Subject line for a forwarded contact message.
#[must_use]
pub fn contact_subject(subject: &str) -> String {
    format!("BookBazar Contact: {subject}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn message() -> ContactMessage {
        ContactMessage {
            name: "Ada Reader".to_string(),
            email: Email::parse("ada@example.org").unwrap(),
            subject: "Missing chapter".to_string(),
            message: "Page 212 is blank in my copy.".to_string(),
        }
    }

    #[test]
    fn test_contact_subject() {
        assert_eq!(contact_subject("Hello there"), "BookBazar Contact: Hello there");
    }

    #[test]
    fn test_contact_text_lists_sender_and_message() {
        let message = message();
        let text = ContactEmailText { message: &message }.render().unwrap();
        assert!(text.contains("Ada Reader"));
        assert!(text.contains("ada@example.org"));
        assert!(text.contains("Page 212 is blank in my copy."));
    }

    #[test]
    fn test_contact_html_escapes_input() {
        let mut message = message();
        message.message = "<script>alert(1)</script>".to_string();
        let html = ContactEmailHtml { message: &message }.render().unwrap();
        assert!(!html.contains("<script>"));
    }

    #[tokio::test]
    async fn test_disabled_service_logs_instead_of_sending() {
        let service = EmailService::new(&EmailConfig {
            smtp: None,
            from: "BookBazar <noreply@bookbazar.local>".to_string(),
            contact_inbox: "shop@bookbazar.local".to_string(),
        })
        .unwrap();
        assert!(!service.is_enabled());
        assert!(service.send_contact(&message()).await.is_ok());
    }

    #[test]
    fn test_parse_mailbox_accepts_display_names() {
        assert!(parse_mailbox("BookBazar <noreply@bookbazar.local>").is_ok());
        assert!(matches!(
            parse_mailbox("not an address"),
            Err(EmailError::InvalidAddress(_))
        ));
    }
}
