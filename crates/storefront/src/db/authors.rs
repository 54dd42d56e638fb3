//! Author and publisher lookups.
//!
//! Staff type author and publisher names into the product form; a name
//! that matches an existing row (case-insensitively) reuses it.

use sqlx::PgPool;

use bookbazar_core::{AuthorId, PublisherId, slug_candidate, slugify};

use super::RepositoryError;
use crate::models::{Author, Publisher};

/// Repository for authors and publishers.
pub struct AuthorRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AuthorRepository<'a> {
    /// Create a new author repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an author by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Author>, RepositoryError> {
        let author = sqlx::query_as::<_, Author>(
            "SELECT id, name, slug, bio, image FROM storefront.author WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(author)
    }

    /// Find an author by name ignoring case, creating one if none exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_or_create(&self, name: &str) -> Result<AuthorId, RepositoryError> {
        let name = name.trim();
        if let Some(id) = sqlx::query_scalar::<_, AuthorId>(
            "SELECT id FROM storefront.author WHERE lower(name) = lower($1) ORDER BY id LIMIT 1",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?
        {
            return Ok(id);
        }

        let base = slugify(name);
        let mut n = 0;
        loop {
            let inserted = sqlx::query_scalar::<_, AuthorId>(
                r"
                INSERT INTO storefront.author (name, slug) VALUES ($1, $2)
                ON CONFLICT (slug) DO NOTHING
                RETURNING id
                ",
            )
            .bind(name)
            .bind(slug_candidate(&base, n))
            .fetch_optional(self.pool)
            .await?;

            if let Some(id) = inserted {
                tracing::info!(author = %name, "Created author");
                return Ok(id);
            }
            n += 1;
        }
    }

    /// Find a publisher by name ignoring case, creating one if none exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_or_create_publisher(
        &self,
        name: &str,
    ) -> Result<PublisherId, RepositoryError> {
        let name = name.trim();
        if let Some(id) = sqlx::query_scalar::<_, PublisherId>(
            "SELECT id FROM storefront.publisher WHERE lower(name) = lower($1) ORDER BY id LIMIT 1",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?
        {
            return Ok(id);
        }

        let id = sqlx::query_scalar::<_, PublisherId>(
            "INSERT INTO storefront.publisher (name) VALUES ($1) RETURNING id",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }

    /// Replace an author's biography.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_bio(&self, id: AuthorId, bio: &str) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE storefront.author SET bio = $2 WHERE id = $1")
            .bind(id)
            .bind(bio)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Set or clear an author's photo.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_image(&self, id: AuthorId, image: Option<&str>) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE storefront.author SET image = $2 WHERE id = $1")
            .bind(id)
            .bind(image)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Get a publisher by name ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_publisher_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Publisher>, RepositoryError> {
        let publisher = sqlx::query_as::<_, Publisher>(
            "SELECT id, name, website, description FROM storefront.publisher
             WHERE lower(name) = lower($1) ORDER BY id LIMIT 1",
        )
        .bind(name.trim())
        .fetch_optional(self.pool)
        .await?;
        Ok(publisher)
    }

    /// Set a publisher's website and description.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_publisher_details(
        &self,
        id: PublisherId,
        website: Option<&str>,
        description: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE storefront.publisher SET website = $2, description = $3 WHERE id = $1")
            .bind(id)
            .bind(website)
            .bind(description)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Get a publisher by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_publisher(&self, id: PublisherId) -> Result<Option<Publisher>, RepositoryError> {
        let publisher = sqlx::query_as::<_, Publisher>(
            "SELECT id, name, website, description FROM storefront.publisher WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(publisher)
    }
}
