//! Book gallery images.
//!
//! A book's first image becomes its primary one. Every write locks the book
//! row so the one-primary-per-book index is never raced.

use sqlx::{PgConnection, PgPool};

use bookbazar_core::{BookId, BookImageId};

use super::RepositoryError;
use crate::models::BookImage;

const IMAGE_COLUMNS: &str = "id, book_id, image, caption, is_primary, created_at";

/// Most images a gallery holds.
pub const MAX_GALLERY_IMAGES: i64 = 8;

/// Repository for book gallery images.
pub struct BookImageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BookImageRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A book's images, primary first, then oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, book: BookId) -> Result<Vec<BookImage>, RepositoryError> {
        let images = sqlx::query_as::<_, BookImage>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM storefront.book_image
             WHERE book_id = $1 ORDER BY is_primary DESC, created_at, id"
        ))
        .bind(book)
        .fetch_all(self.pool)
        .await?;
        Ok(images)
    }

    /// Add images under one caption, keeping the gallery within
    /// [`MAX_GALLERY_IMAGES`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` when the gallery would overflow,
    /// or `RepositoryError::NotFound` if the book is gone.
    pub async fn add(
        &self,
        book: BookId,
        paths: &[String],
        caption: &str,
    ) -> Result<Vec<BookImage>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_book(&mut tx, book).await?;

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM storefront.book_image WHERE book_id = $1",
        )
        .bind(book)
        .fetch_one(&mut *tx)
        .await?;
        let incoming = i64::try_from(paths.len()).unwrap_or(i64::MAX);
        if existing.saturating_add(incoming) > MAX_GALLERY_IMAGES {
            return Err(RepositoryError::Conflict(format!(
                "a book holds at most {MAX_GALLERY_IMAGES} images"
            )));
        }

        let mut added = Vec::with_capacity(paths.len());
        for path in paths {
            let image = sqlx::query_as::<_, BookImage>(&format!(
                r"
                INSERT INTO storefront.book_image (book_id, image, caption, is_primary)
                VALUES ($1, $2, $3, NOT EXISTS (
                    SELECT 1 FROM storefront.book_image WHERE book_id = $1 AND is_primary
                ))
                RETURNING {IMAGE_COLUMNS}
                "
            ))
            .bind(book)
            .bind(path)
            .bind(caption)
            .fetch_one(&mut *tx)
            .await?;
            added.push(image);
        }

        tx.commit().await?;
        Ok(added)
    }

    /// Make one image the book's primary.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the image is not the book's.
    pub async fn set_primary(&self, book: BookId, id: BookImageId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_book(&mut tx, book).await?;

        sqlx::query(
            "UPDATE storefront.book_image SET is_primary = FALSE WHERE book_id = $1 AND is_primary",
        )
        .bind(book)
        .execute(&mut *tx)
        .await?;
        let result = sqlx::query(
            "UPDATE storefront.book_image SET is_primary = TRUE WHERE id = $1 AND book_id = $2",
        )
        .bind(id)
        .bind(book)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Delete an image and return its stored path. Removing the primary
    /// promotes the oldest remaining image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the image is not the book's.
    pub async fn delete(&self, book: BookId, id: BookImageId) -> Result<String, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_book(&mut tx, book).await?;

        let (path, was_primary) = sqlx::query_as::<_, (String, bool)>(
            "DELETE FROM storefront.book_image WHERE id = $1 AND book_id = $2
             RETURNING image, is_primary",
        )
        .bind(id)
        .bind(book)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if was_primary {
            sqlx::query(
                r"
                UPDATE storefront.book_image SET is_primary = TRUE
                WHERE id = (
                    SELECT id FROM storefront.book_image
                    WHERE book_id = $1 ORDER BY created_at, id LIMIT 1
                )
                ",
            )
            .bind(book)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(path)
    }
}

async fn lock_book(conn: &mut PgConnection, book: BookId) -> Result<(), RepositoryError> {
    sqlx::query_scalar::<_, BookId>("SELECT id FROM storefront.book WHERE id = $1 FOR UPDATE")
        .bind(book)
        .fetch_optional(conn)
        .await?
        .map(|_| ())
        .ok_or(RepositoryError::NotFound)
}
