//! Subcommand implementations.

pub mod coupon;
pub mod migrate;
pub mod seed;
pub mod staff;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use bookbazar_storefront::db::{RepositoryError, create_pool};
use bookbazar_storefront::services::auth::AuthError;

/// Errors shared by every command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Neither database URL variable is set.
    #[error("Missing environment variable: STOREFRONT_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("No user with email: {0}")]
    UnknownUser(String),

    /// Input failed validation; each entry is one problem.
    #[error("{} validation error(s): {}", .0.len(), .0.join("; "))]
    Invalid(Vec<String>),

    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// The storefront database URL, preferring `STOREFRONT_DATABASE_URL`.
fn database_url() -> Result<SecretString, CliError> {
    dotenvy::dotenv().ok();

    std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CliError::MissingDatabaseUrl)
}

/// Connect to the storefront database.
async fn connect() -> Result<PgPool, CliError> {
    let pool = create_pool(&database_url()?).await?;
    tracing::info!("Connected to database");
    Ok(pool)
}
