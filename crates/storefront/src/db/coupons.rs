//! Coupon repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bookbazar_core::{CouponId, Money};

use super::{RepositoryError, conflict_on_unique};
use crate::models::Coupon;

const COUPON_COLUMNS: &str = "id, code, amount, valid_from, valid_to, active";

/// Bulk actions from the admin coupon list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponAction {
    Activate,
    Deactivate,
}

/// Repository for coupon database operations.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up a coupon by its normalized (upper-case) code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM storefront.coupon WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(self.pool)
        .await?;
        Ok(coupon)
    }

    /// Get a coupon by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CouponId) -> Result<Option<Coupon>, RepositoryError> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM storefront.coupon WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(coupon)
    }

    /// Every coupon, latest expiry first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Coupon>, RepositoryError> {
        let coupons = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM storefront.coupon ORDER BY valid_to DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(coupons)
    }

    /// Create a coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code already exists.
    pub async fn create(
        &self,
        code: &str,
        amount: Money,
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
    ) -> Result<Coupon, RepositoryError> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            r"
            INSERT INTO storefront.coupon (code, amount, valid_from, valid_to)
            VALUES ($1, $2, $3, $4)
            RETURNING {COUPON_COLUMNS}
            "
        ))
        .bind(code)
        .bind(amount)
        .bind(valid_from)
        .bind(valid_to)
        .fetch_one(self.pool)
        .await
        .map_err(conflict_on_unique("coupon"))?;
        Ok(coupon)
    }

    /// Apply an admin action; returns the number of coupons changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn apply_action(
        &self,
        action: CouponAction,
        ids: &[i32],
    ) -> Result<u64, RepositoryError> {
        let active = matches!(action, CouponAction::Activate);
        let result = sqlx::query("UPDATE storefront.coupon SET active = $2 WHERE id = ANY($1)")
            .bind(ids)
            .bind(active)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
