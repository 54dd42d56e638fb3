//! Order repository.
//!
//! The open (unpaid) order is rebuilt from the cart whenever checkout
//! needs it; `order_item` rows carry the prices seen at that moment.

use sqlx::{PgConnection, PgPool};

use bookbazar_core::{AddressId, CouponId, Money, OrderId, PaymentId, UserId};

use super::{RepositoryError, like_pattern};
use crate::models::{Order, OrderLine};

const ORDER_COLUMNS: &str = "o.id, o.user_id, o.ref_code, o.start_date, o.ordered_date, \
     o.ordered, o.shipping_address_id, o.billing_address_id, o.payment_id, o.coupon_id, \
     o.being_delivered, o.received, o.refund_requested, o.refund_granted";

/// Total of an order: line finals minus the coupon, never below zero.
const ORDER_TOTAL: &str = r"
    GREATEST(
        COALESCE((SELECT SUM(oi.quantity * oi.unit_final_price)
                  FROM storefront.order_item oi WHERE oi.order_id = o.id), 0)
        - COALESCE((SELECT cp.amount FROM storefront.coupon cp WHERE cp.id = o.coupon_id), 0),
        0)
";

/// An order with its total and owner email, for list pages.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderOverview {
    #[sqlx(flatten)]
    pub order: Order,
    pub user_email: String,
    pub total: Money,
}

/// Status filter on the admin order list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderFilter {
    Ordered,
    BeingDelivered,
    Received,
    RefundRequested,
    RefundGranted,
}

impl OrderFilter {
    pub const ALL: [Self; 5] = [
        Self::Ordered,
        Self::BeingDelivered,
        Self::Received,
        Self::RefundRequested,
        Self::RefundGranted,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ordered => "ordered",
            Self::BeingDelivered => "being_delivered",
            Self::Received => "received",
            Self::RefundRequested => "refund_requested",
            Self::RefundGranted => "refund_granted",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ordered => "Paid",
            Self::BeingDelivered => "Being delivered",
            Self::Received => "Received",
            Self::RefundRequested => "Refund requested",
            Self::RefundGranted => "Refund granted",
        }
    }
}

/// Bulk actions from the admin order list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    MarkDelivered,
    MarkReceived,
    GrantRefunds,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Rebuild the user's open order from their cart at current prices.
    ///
    /// Returns `None` when the cart is empty.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails; nothing is
    /// changed in that case.
    pub async fn sync_open_order(&self, user: UserId) -> Result<Option<Order>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            INSERT INTO storefront.order AS o (user_id) VALUES ($1)
            ON CONFLICT (user_id) WHERE NOT ordered DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(user)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM storefront.order_item WHERE order_id = $1 AND NOT ordered")
            .bind(order.id)
            .execute(&mut *tx)
            .await?;

        let copied = sqlx::query(
            r"
            INSERT INTO storefront.order_item
                (order_id, user_id, book_id, quantity, unit_price, unit_final_price)
            SELECT $1, c.user_id, ci.book_id, ci.quantity, b.price,
                   CASE WHEN b.discount_price IS NOT NULL AND b.discount_price < b.price
                        THEN b.discount_price ELSE b.price END
            FROM storefront.cart_item ci
            JOIN storefront.cart c ON c.id = ci.cart_id
            JOIN storefront.book b ON b.id = ci.book_id
            WHERE c.user_id = $2
            ORDER BY ci.added_at, ci.id
            ",
        )
        .bind(order.id)
        .bind(user)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if copied.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(order))
    }

    /// The user's open order as stored, without re-syncing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn open_order(&self, user: UserId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.order o WHERE o.user_id = $1 AND NOT o.ordered"
        ))
        .bind(user)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Items of an order with book titles.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, order: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        order_lines(&mut conn, order).await
    }

    /// Attach or detach a coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_coupon(
        &self,
        order: OrderId,
        coupon: Option<CouponId>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE storefront.order SET coupon_id = $2 WHERE id = $1")
            .bind(order)
            .bind(coupon)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Set the shipping and billing addresses chosen at checkout.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_addresses(
        &self,
        order: OrderId,
        shipping: AddressId,
        billing: AddressId,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE storefront.order SET shipping_address_id = $2, billing_address_id = $3 WHERE id = $1",
        )
        .bind(order)
        .bind(shipping)
        .bind(billing)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// The user's paid orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn paid_orders(&self, user: UserId) -> Result<Vec<OrderOverview>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderOverview>(&format!(
            r"
            SELECT {ORDER_COLUMNS}, u.email AS user_email, {ORDER_TOTAL} AS total
            FROM storefront.order o
            JOIN storefront.user u ON u.id = o.user_id
            WHERE o.user_id = $1 AND o.ordered
            ORDER BY o.ordered_date DESC
            "
        ))
        .bind(user)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// A paid order by reference code, only if it belongs to `user`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_ref(
        &self,
        user: UserId,
        ref_code: &str,
    ) -> Result<Option<OrderOverview>, RepositoryError> {
        let order = sqlx::query_as::<_, OrderOverview>(&format!(
            r"
            SELECT {ORDER_COLUMNS}, u.email AS user_email, {ORDER_TOTAL} AS total
            FROM storefront.order o
            JOIN storefront.user u ON u.id = o.user_id
            WHERE o.user_id = $1 AND o.ref_code = $2
            "
        ))
        .bind(user)
        .bind(ref_code)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Staff list of paid orders, searchable by ref code or email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn admin_list(
        &self,
        query: &str,
        filter: Option<OrderFilter>,
    ) -> Result<Vec<OrderOverview>, RepositoryError> {
        let flag = filter.map_or("TRUE", |f| match f {
            OrderFilter::Ordered => "o.ordered",
            OrderFilter::BeingDelivered => "o.being_delivered",
            OrderFilter::Received => "o.received",
            OrderFilter::RefundRequested => "o.refund_requested",
            OrderFilter::RefundGranted => "o.refund_granted",
        });
        let orders = sqlx::query_as::<_, OrderOverview>(&format!(
            r"
            SELECT {ORDER_COLUMNS}, u.email AS user_email, {ORDER_TOTAL} AS total
            FROM storefront.order o
            JOIN storefront.user u ON u.id = o.user_id
            WHERE o.ordered AND {flag}
              AND (o.ref_code ILIKE $1 OR u.email ILIKE $1)
            ORDER BY o.ordered_date DESC
            "
        ))
        .bind(like_pattern(query.trim()))
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// Apply an admin action; returns the number of orders changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn apply_action(
        &self,
        action: OrderAction,
        ids: &[i32],
    ) -> Result<u64, RepositoryError> {
        let set = match action {
            OrderAction::MarkDelivered => "being_delivered = TRUE",
            OrderAction::MarkReceived => "received = TRUE",
            OrderAction::GrantRefunds => "refund_granted = TRUE",
        };
        let result = sqlx::query(&format!(
            "UPDATE storefront.order SET {set} WHERE id = ANY($1) AND ordered"
        ))
        .bind(ids)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Paid orders not yet shipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn awaiting_delivery(&self) -> Result<i64, RepositoryError> {
        let n = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM storefront.order WHERE ordered AND NOT being_delivered",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(n)
    }
}

/// Items of an order with book titles, read on the caller's connection.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn order_lines(
    conn: &mut PgConnection,
    order: OrderId,
) -> Result<Vec<OrderLine>, RepositoryError> {
    let lines = sqlx::query_as::<_, OrderLine>(
        r"
        SELECT oi.id, oi.order_id, oi.book_id, b.slug, b.title, oi.quantity,
               oi.unit_price, oi.unit_final_price
        FROM storefront.order_item oi
        JOIN storefront.book b ON b.id = oi.book_id
        WHERE oi.order_id = $1
        ORDER BY oi.id
        ",
    )
    .bind(order)
    .fetch_all(conn)
    .await?;
    Ok(lines)
}

/// Lock an unpaid order for the rest of the caller's transaction.
///
/// Returns `false` when the order is already paid, including when another
/// payment committed while this one waited for the lock.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_unpaid(conn: &mut PgConnection, order: OrderId) -> Result<bool, RepositoryError> {
    let locked = sqlx::query_scalar::<_, OrderId>(
        "SELECT id FROM storefront.order WHERE id = $1 AND NOT ordered FOR UPDATE",
    )
    .bind(order)
    .fetch_optional(conn)
    .await?;
    Ok(locked.is_some())
}

/// Mark an order and its items paid, on the caller's transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the ref code collides, or
/// `RepositoryError::NotFound` if the order was already paid.
pub async fn mark_ordered(
    conn: &mut PgConnection,
    order: OrderId,
    payment: PaymentId,
    ref_code: &str,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE storefront.order_item SET ordered = TRUE WHERE order_id = $1")
        .bind(order)
        .execute(&mut *conn)
        .await?;

    let result = sqlx::query(
        r"
        UPDATE storefront.order
        SET ordered = TRUE, ordered_date = NOW(), payment_id = $2, ref_code = $3
        WHERE id = $1 AND NOT ordered
        ",
    )
    .bind(order)
    .bind(payment)
    .bind(ref_code)
    .execute(&mut *conn)
    .await
    .map_err(super::conflict_on_unique("order reference"))?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}
