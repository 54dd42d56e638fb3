//! BookBazar CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! bb-cli migrate
//!
//! # Create a staff user, or promote an existing one
//! bb-cli staff create -e staff@example.com -p 'a long password'
//! bb-cli staff promote -e reader@example.com
//!
//! # Load categories, authors, publishers, and books
//! bb-cli seed -f catalog.yaml
//!
//! # Create a coupon worth $5 for 30 days
//! bb-cli coupon create -c SPRING5 -a 5
//! ```
//!
//! All commands read `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`), loading
//! `.env` if present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "bb-cli")]
#[command(author, version, about = "BookBazar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage staff users
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },
    /// Seed the catalog from a YAML file
    Seed {
        /// Path to the catalog YAML file
        #[arg(short, long)]
        file: String,

        /// Delete the existing catalog first
        #[arg(long)]
        clear: bool,
    },
    /// Manage coupons
    Coupon {
        #[command(subcommand)]
        action: CouponAction,
    },
}

#[derive(Subcommand)]
enum StaffAction {
    /// Create a new staff user
    Create {
        /// Staff email address
        #[arg(short, long)]
        email: String,

        /// Initial password
        #[arg(short, long)]
        password: String,
    },
    /// Give an existing user staff access
    Promote {
        /// Email of the user to promote
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum CouponAction {
    /// Create an active coupon
    Create {
        /// Coupon code (stored uppercase)
        #[arg(short, long)]
        code: String,

        /// Discount in dollars
        #[arg(short, long)]
        amount: String,

        /// Days the coupon stays valid
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Staff { action } => match action {
            StaffAction::Create { email, password } => {
                commands::staff::create(&email, &password).await?;
            }
            StaffAction::Promote { email } => commands::staff::promote(&email).await?,
        },
        Commands::Seed { file, clear } => commands::seed::run(&file, clear).await?,
        Commands::Coupon { action } => match action {
            CouponAction::Create { code, amount, days } => {
                commands::coupon::create(&code, &amount, days).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_coupon_days_default() {
        let cli = Cli::try_parse_from(["bb-cli", "coupon", "create", "-c", "SPRING5", "-a", "5"])
            .unwrap_or_else(|e| panic!("{e}"));
        match cli.command {
            Commands::Coupon {
                action: CouponAction::Create { days, .. },
            } => assert_eq!(days, 30),
            _ => panic!("expected coupon create"),
        }
    }
}
