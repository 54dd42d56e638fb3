//! Cart repository.
//!
//! Each user owns a single cart row; it is created at registration and
//! re-created on demand if it ever goes missing.

use sqlx::{PgConnection, PgPool};

use bookbazar_core::{BookId, CartId, UserId};

use super::RepositoryError;
use crate::models::CartLine;

/// Result of adding a book to a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// New line with quantity 1.
    Added,
    /// Existing line incremented.
    Incremented,
    /// Existing line already holds every copy in stock.
    AtStockLimit,
}

/// Result of removing one copy from a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOneOutcome {
    Decremented,
    Removed,
    NotInCart,
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's cart id, creating the cart if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn cart_id(&self, user: UserId) -> Result<CartId, RepositoryError> {
        let id = sqlx::query_scalar::<_, CartId>(
            r"
            INSERT INTO storefront.cart (user_id) VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = storefront.cart.updated_at
            RETURNING id
            ",
        )
        .bind(user)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }

    /// Add one copy of a book, never exceeding `stock`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn add(
        &self,
        user: UserId,
        book: BookId,
        stock: i32,
    ) -> Result<AddOutcome, RepositoryError> {
        let cart = self.cart_id(user).await?;

        // The conditional DO UPDATE returns no row when the line is at the limit.
        let inserted = sqlx::query_scalar::<_, bool>(
            r"
            INSERT INTO storefront.cart_item (cart_id, book_id, quantity)
            VALUES ($1, $2, 1)
            ON CONFLICT (cart_id, book_id) DO UPDATE
            SET quantity = storefront.cart_item.quantity + 1
            WHERE storefront.cart_item.quantity < $3
            RETURNING (xmax = 0)
            ",
        )
        .bind(cart)
        .bind(book)
        .bind(stock)
        .fetch_optional(self.pool)
        .await?;

        sqlx::query("UPDATE storefront.cart SET updated_at = NOW() WHERE id = $1")
            .bind(cart)
            .execute(self.pool)
            .await?;

        Ok(match inserted {
            Some(true) => AddOutcome::Added,
            Some(false) => AddOutcome::Incremented,
            None => AddOutcome::AtStockLimit,
        })
    }

    /// Delete a book's line. Returns `false` if it was not in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove(&self, user: UserId, book: BookId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM storefront.cart_item ci
            USING storefront.cart c
            WHERE ci.cart_id = c.id AND c.user_id = $1 AND ci.book_id = $2
            ",
        )
        .bind(user)
        .bind(book)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Take one copy off a line, deleting it at quantity 1.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn remove_one(
        &self,
        user: UserId,
        book: BookId,
    ) -> Result<RemoveOneOutcome, RepositoryError> {
        let decremented = sqlx::query(
            r"
            UPDATE storefront.cart_item ci SET quantity = ci.quantity - 1
            FROM storefront.cart c
            WHERE ci.cart_id = c.id AND c.user_id = $1 AND ci.book_id = $2 AND ci.quantity > 1
            ",
        )
        .bind(user)
        .bind(book)
        .execute(self.pool)
        .await?;

        if decremented.rows_affected() > 0 {
            return Ok(RemoveOneOutcome::Decremented);
        }
        if self.remove(user, book).await? {
            Ok(RemoveOneOutcome::Removed)
        } else {
            Ok(RemoveOneOutcome::NotInCart)
        }
    }

    /// Cart lines with book details, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(
            r"
            SELECT ci.id, ci.book_id, b.slug, b.title, a.name AS author_name, b.cover_image,
                   b.price, b.discount_price, ci.quantity, b.stock_quantity, b.is_available,
                   ci.added_at
            FROM storefront.cart_item ci
            JOIN storefront.cart c ON c.id = ci.cart_id
            JOIN storefront.book b ON b.id = ci.book_id
            LEFT JOIN storefront.author a ON a.id = b.author_id
            WHERE c.user_id = $1
            ORDER BY ci.added_at, ci.id
            ",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;
        Ok(lines)
    }

    /// Number of distinct books in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn line_count(&self, user: UserId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*) FROM storefront.cart_item ci
            JOIN storefront.cart c ON c.id = ci.cart_id
            WHERE c.user_id = $1
            ",
        )
        .bind(user)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }
}

/// Empty a user's cart on the caller's transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn clear(conn: &mut PgConnection, user: UserId) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        DELETE FROM storefront.cart_item ci
        USING storefront.cart c
        WHERE ci.cart_id = c.id AND c.user_id = $1
        ",
    )
    .bind(user)
    .execute(conn)
    .await?;
    Ok(())
}
