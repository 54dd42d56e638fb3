//! Payment repository.

use sqlx::{PgConnection, PgPool};

use bookbazar_core::{Money, PaymentId, UserId};

use super::RepositoryError;
use crate::models::Payment;

const PAYMENT_SELECT: &str = r"
    SELECT p.id, p.stripe_charge_id, p.user_id, u.email AS user_email, p.amount, p.created_at
    FROM storefront.payment p
    LEFT JOIN storefront.user u ON u.id = p.user_id
";

/// Repository for payment database operations.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a payment by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
        let payment = sqlx::query_as::<_, Payment>(&format!("{PAYMENT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(payment)
    }

    /// Every payment, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Payment>, RepositoryError> {
        let payments =
            sqlx::query_as::<_, Payment>(&format!("{PAYMENT_SELECT} ORDER BY p.created_at DESC"))
                .fetch_all(self.pool)
                .await?;
        Ok(payments)
    }
}

/// Record a captured charge on the caller's transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert(
    conn: &mut PgConnection,
    charge_id: &str,
    user: UserId,
    amount: Money,
) -> Result<PaymentId, RepositoryError> {
    let id = sqlx::query_scalar::<_, PaymentId>(
        r"
        INSERT INTO storefront.payment (stripe_charge_id, user_id, amount)
        VALUES ($1, $2, $3)
        RETURNING id
        ",
    )
    .bind(charge_id)
    .bind(user)
    .bind(amount)
    .fetch_one(conn)
    .await?;
    Ok(id)
}
