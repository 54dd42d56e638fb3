//! Staff account commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a staff account (profile and cart included)
//! bb-cli staff create -e staff@example.com -p 'a long password'
//!
//! # Give an existing customer staff access
//! bb-cli staff promote -e reader@example.com
//! ```

use bookbazar_core::Email;
use bookbazar_storefront::db::RepositoryError;
use bookbazar_storefront::db::users::UserRepository;
use bookbazar_storefront::services::auth::AuthService;

use super::{CliError, connect};

fn parse_email(email: &str) -> Result<Email, CliError> {
    Email::parse(email).map_err(|_| CliError::InvalidEmail(email.to_owned()))
}

/// Create a staff user. An existing email is an error.
///
/// # Errors
///
/// Returns an error for an invalid email, a weak password, a taken email,
/// or a database failure.
pub async fn create(email: &str, password: &str) -> Result<(), CliError> {
    let email = parse_email(email)?;
    let pool = connect().await?;

    let user = AuthService::new(&pool)
        .register_staff(&email, password)
        .await?;

    tracing::info!("Staff user created successfully!");
    tracing::info!("  ID: {}", user.id);
    tracing::info!("  Email: {}", user.email);
    Ok(())
}

/// Mark an existing user as staff.
///
/// # Errors
///
/// Returns an error if no user has this email or the update fails.
pub async fn promote(email: &str) -> Result<(), CliError> {
    let parsed = parse_email(email)?;
    let pool = connect().await?;

    match UserRepository::new(&pool).promote_to_staff(&parsed).await {
        Ok(()) => {
            tracing::info!(email = %parsed, "User promoted to staff");
            Ok(())
        }
        Err(RepositoryError::NotFound) => Err(CliError::UnknownUser(email.to_owned())),
        Err(err) => Err(err.into()),
    }
}
