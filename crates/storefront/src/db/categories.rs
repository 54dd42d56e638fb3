//! Category repository.

use sqlx::PgPool;

use bookbazar_core::{CategoryId, slug_candidate, slugify};

use super::{RepositoryError, conflict_on_unique, like_pattern};
use crate::models::{Category, CategoryLink, CategorySummary};

/// A back-office category row: every book counts, available or not.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryOverview {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub parent_name: Option<String>,
    pub book_count: i64,
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every category by name, for form dropdowns.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, parent_id, created_at
             FROM storefront.category ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// Sidebar links with the number of available books in each category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn links(&self) -> Result<Vec<CategoryLink>, RepositoryError> {
        let links = sqlx::query_as::<_, CategoryLink>(
            r"
            SELECT c.name, c.slug,
                   COUNT(b.id) FILTER (WHERE b.is_available) AS book_count
            FROM storefront.category c
            LEFT JOIN storefront.book b ON b.category_id = c.id
            GROUP BY c.id
            ORDER BY c.name
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(links)
    }

    /// Categories with available-book and child counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn summaries(&self) -> Result<Vec<CategorySummary>, RepositoryError> {
        let summaries = sqlx::query_as::<_, CategorySummary>(
            r"
            SELECT c.id, c.name, c.slug, c.description, c.parent_id,
                   (SELECT COUNT(*) FROM storefront.book b
                     WHERE b.category_id = c.id AND b.is_available) AS book_count,
                   (SELECT COUNT(*) FROM storefront.category ch
                     WHERE ch.parent_id = c.id) AS children_count
            FROM storefront.category c
            ORDER BY c.name
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(summaries)
    }

    /// Categories matching `query` by name, with their total book counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn admin_list(&self, query: &str) -> Result<Vec<CategoryOverview>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryOverview>(
            r"
            SELECT c.id, c.name, c.slug, p.name AS parent_name,
                   (SELECT COUNT(*) FROM storefront.book b WHERE b.category_id = c.id) AS book_count
            FROM storefront.category c
            LEFT JOIN storefront.category p ON p.id = c.parent_id
            WHERE c.name ILIKE $1
            ORDER BY c.name
            ",
        )
        .bind(like_pattern(query.trim()))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Get a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, parent_id, created_at
             FROM storefront.category WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(category)
    }

    /// Direct children of a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn children(&self, parent: CategoryId) -> Result<Vec<Category>, RepositoryError> {
        let children = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, parent_id, created_at
             FROM storefront.category WHERE parent_id = $1 ORDER BY name",
        )
        .bind(parent)
        .fetch_all(self.pool)
        .await?;
        Ok(children)
    }

    /// Whether a category id exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM storefront.category WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Insert a category with a unique slug derived from its name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is already taken.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        parent: Option<CategoryId>,
    ) -> Result<Category, RepositoryError> {
        let base = slugify(name);
        let mut n = 0;
        let slug = loop {
            let candidate = slug_candidate(&base, n);
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM storefront.category WHERE slug = $1)",
            )
            .bind(&candidate)
            .fetch_one(self.pool)
            .await?;
            if !taken {
                break candidate;
            }
            n += 1;
        };

        let category = sqlx::query_as::<_, Category>(
            r"
            INSERT INTO storefront.category (name, slug, description, parent_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, slug, description, parent_id, created_at
            ",
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(parent)
        .fetch_one(self.pool)
        .await
        .map_err(conflict_on_unique("category"))?;

        Ok(category)
    }
}
