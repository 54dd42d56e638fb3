//! Wishlist repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bookbazar_core::{BookId, Money, UserId, WishlistItemId};

use super::{RepositoryError, like_pattern};

/// A wishlist entry with the book details the summary page shows.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WishlistEntry {
    pub id: WishlistItemId,
    pub book_id: BookId,
    pub slug: String,
    pub title: String,
    pub author_name: Option<String>,
    pub cover_image: Option<String>,
    pub price: Money,
    pub discount_price: Option<Money>,
    pub added_date: DateTime<Utc>,
}

/// A wishlist entry in the back office, with its owner and stock state.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WishlistOverview {
    pub id: WishlistItemId,
    pub user_email: String,
    pub slug: String,
    pub title: String,
    pub author_name: Option<String>,
    pub price: Money,
    pub is_available: bool,
    pub added_date: DateTime<Utc>,
}

/// Repository for wishlist database operations.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a book. Returns `false` if it was already there.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn add(&self, user: UserId, book: BookId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO storefront.wishlist (user_id, book_id) VALUES ($1, $2)
            ON CONFLICT (user_id, book_id) DO NOTHING
            ",
        )
        .bind(user)
        .bind(book)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Remove a book. Returns `false` if it was not there.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove(&self, user: UserId, book: BookId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM storefront.wishlist WHERE user_id = $1 AND book_id = $2")
                .bind(user)
                .bind(book)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether the book is on the user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn contains(&self, user: UserId, book: BookId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM storefront.wishlist WHERE user_id = $1 AND book_id = $2)",
        )
        .bind(user)
        .bind(book)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// The user's wishlist, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user: UserId) -> Result<Vec<WishlistEntry>, RepositoryError> {
        let entries = sqlx::query_as::<_, WishlistEntry>(
            r"
            SELECT w.id, w.book_id, b.slug, b.title, a.name AS author_name, b.cover_image,
                   b.price, b.discount_price, w.added_date
            FROM storefront.wishlist w
            JOIN storefront.book b ON b.id = w.book_id
            LEFT JOIN storefront.author a ON a.id = b.author_id
            WHERE w.user_id = $1
            ORDER BY w.added_date DESC, w.id DESC
            ",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;
        Ok(entries)
    }

    /// Every wishlist entry matching `query` on owner email, title or
    /// author, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn admin_list(&self, query: &str) -> Result<Vec<WishlistOverview>, RepositoryError> {
        let entries = sqlx::query_as::<_, WishlistOverview>(
            r"
            SELECT w.id, u.email AS user_email, b.slug, b.title, a.name AS author_name,
                   b.price, b.is_available, w.added_date
            FROM storefront.wishlist w
            JOIN storefront.user u ON u.id = w.user_id
            JOIN storefront.book b ON b.id = w.book_id
            LEFT JOIN storefront.author a ON a.id = b.author_id
            WHERE u.email ILIKE $1 OR b.title ILIKE $1 OR a.name ILIKE $1
            ORDER BY w.added_date DESC, w.id DESC
            ",
        )
        .bind(like_pattern(query.trim()))
        .fetch_all(self.pool)
        .await?;
        Ok(entries)
    }
}
