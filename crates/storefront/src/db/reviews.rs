//! Book review repository.

use sqlx::PgPool;

use bookbazar_core::{BookId, UserId};

use super::RepositoryError;
use crate::models::Review;

const REVIEW_SELECT: &str = r"
    SELECT r.id, r.book_id, b.title AS book_title, r.user_id, u.email AS user_email,
           r.rating, r.title, r.comment, r.is_approved, r.created_at
    FROM storefront.book_review r
    JOIN storefront.book b ON b.id = r.book_id
    JOIN storefront.user u ON u.id = r.user_id
";

/// Moderation actions from the admin review list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Unapprove,
    Delete,
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Approved reviews for a book, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn approved_for_book(&self, book: BookId) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "{REVIEW_SELECT} WHERE r.book_id = $1 AND r.is_approved ORDER BY r.created_at DESC"
        ))
        .bind(book)
        .fetch_all(self.pool)
        .await?;
        Ok(reviews)
    }

    /// Create or replace a user's review of a book. It goes back to moderation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        book: BookId,
        user: UserId,
        rating: i16,
        title: &str,
        comment: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.book_review (book_id, user_id, rating, title, comment)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (book_id, user_id) DO UPDATE
            SET rating = EXCLUDED.rating,
                title = EXCLUDED.title,
                comment = EXCLUDED.comment,
                is_approved = FALSE,
                created_at = NOW()
            ",
        )
        .bind(book)
        .bind(user)
        .bind(rating)
        .bind(title)
        .bind(comment)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// All reviews, pending first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn admin_list(&self) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "{REVIEW_SELECT} ORDER BY r.is_approved, r.created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(reviews)
    }

    /// Apply a moderation action; returns the number of reviews affected.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn apply_action(
        &self,
        action: ReviewAction,
        ids: &[i32],
    ) -> Result<u64, RepositoryError> {
        let sql = match action {
            ReviewAction::Approve => {
                "UPDATE storefront.book_review SET is_approved = TRUE WHERE id = ANY($1)"
            }
            ReviewAction::Unapprove => {
                "UPDATE storefront.book_review SET is_approved = FALSE WHERE id = ANY($1)"
            }
            ReviewAction::Delete => "DELETE FROM storefront.book_review WHERE id = ANY($1)",
        };
        let result = sqlx::query(sql).bind(ids).execute(self.pool).await?;
        Ok(result.rows_affected())
    }
}
