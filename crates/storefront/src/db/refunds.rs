//! Refund request repository.

use sqlx::PgPool;

use bookbazar_core::{Email, OrderId};

use super::RepositoryError;
use crate::models::Refund;

/// Bulk actions from the admin refund list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundAction {
    AcceptRefunds,
    RejectRefunds,
}

/// Repository for refund database operations.
pub struct RefundRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RefundRepository<'a> {
    /// Create a new refund repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// File a refund request and flag the order, in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order is unpaid or a refund
    /// was already requested.
    pub async fn request(
        &self,
        order: OrderId,
        reason: &str,
        email: &Email,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let flagged = sqlx::query(
            r"
            UPDATE storefront.order SET refund_requested = TRUE
            WHERE id = $1 AND ordered AND NOT refund_requested
            ",
        )
        .bind(order)
        .execute(&mut *tx)
        .await?;

        if flagged.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(
                "refund already requested or order unpaid".to_owned(),
            ));
        }

        sqlx::query("INSERT INTO storefront.refund (order_id, reason, email) VALUES ($1, $2, $3)")
            .bind(order)
            .bind(reason)
            .bind(email)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Every refund request, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Refund>, RepositoryError> {
        let refunds = sqlx::query_as::<_, Refund>(
            r"
            SELECT r.id, r.order_id, o.ref_code AS order_ref_code, r.reason, r.accepted,
                   r.email, r.created_at
            FROM storefront.refund r
            JOIN storefront.order o ON o.id = r.order_id
            ORDER BY r.created_at DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(refunds)
    }

    /// Requests not yet accepted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn open_count(&self) -> Result<i64, RepositoryError> {
        let n = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM storefront.refund WHERE NOT accepted",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(n)
    }

    /// Apply an admin action; returns the number of requests changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn apply_action(
        &self,
        action: RefundAction,
        ids: &[i32],
    ) -> Result<u64, RepositoryError> {
        let accepted = matches!(action, RefundAction::AcceptRefunds);
        let result = sqlx::query("UPDATE storefront.refund SET accepted = $2 WHERE id = ANY($1)")
            .bind(ids)
            .bind(accepted)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
