//! Coupon command.
//!
//! # Usage
//!
//! ```bash
//! # $5 off, valid for 30 days from now
//! bb-cli coupon create -c SPRING5 -a 5.00
//!
//! bb-cli coupon create -c WEEKEND -a 2.50 --days 3
//! ```

use chrono::Utc;

use bookbazar_storefront::db::RepositoryError;
use bookbazar_storefront::db::coupons::CouponRepository;
use bookbazar_storefront::forms::{CouponCreateForm, FieldErrors};

use super::{CliError, connect};

fn describe(errors: &FieldErrors) -> Vec<String> {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect()
}

/// Create an active coupon valid from now for `days` days.
///
/// The code and amount get the same checks as the back-office form.
///
/// # Errors
///
/// Returns an error for invalid input, a taken code, or a database failure.
pub async fn create(code: &str, amount: &str, days: u32) -> Result<(), CliError> {
    let form = CouponCreateForm {
        code: code.to_owned(),
        amount: amount.to_owned(),
        valid_days: days.to_string(),
    };
    let coupon = form
        .validate(Utc::now())
        .map_err(|errors| CliError::Invalid(describe(&errors)))?;

    let pool = connect().await?;
    let created = CouponRepository::new(&pool)
        .create(&coupon.code, coupon.amount, coupon.valid_from, coupon.valid_to)
        .await
        .map_err(|err| match err {
            RepositoryError::Conflict(_) => {
                CliError::Invalid(vec![format!("code: coupon {} already exists", coupon.code)])
            }
            other => other.into(),
        })?;

    tracing::info!("Coupon created successfully!");
    tracing::info!("  Code: {}", created.code);
    tracing::info!("  Amount: {}", created.amount);
    tracing::info!("  Valid until: {}", created.valid_to.format("%Y-%m-%d %H:%M UTC"));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_prefixes_field_names() {
        let form = CouponCreateForm {
            code: String::new(),
            amount: "-1".to_owned(),
            valid_days: "30".to_owned(),
        };
        let errors = form.validate(Utc::now()).unwrap_err();
        let lines = describe(&errors);
        assert!(lines.iter().any(|l| l.starts_with("code: ")));
        assert!(lines.contains(&"amount: Amount must be greater than 0.".to_owned()));
    }
}
