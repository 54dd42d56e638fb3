//! Cached sidebar categories.
//!
//! Every page shows the category list with available-book counts; the list
//! is read through a short-lived moka cache and dropped whenever books or
//! categories change.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use crate::db::RepositoryError;
use crate::db::categories::CategoryRepository;
use crate::models::CategoryLink;

const TTL: Duration = Duration::from_secs(60);

/// Sidebar category cache. Cheap to clone.
#[derive(Clone)]
pub struct CatalogCache {
    categories: Cache<(), Arc<Vec<CategoryLink>>>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            categories: Cache::builder().max_capacity(1).time_to_live(TTL).build(),
        }
    }

    /// Categories with book counts, loaded on a miss.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database query fails.
    pub async fn categories(&self, pool: &PgPool) -> Result<Arc<Vec<CategoryLink>>, RepositoryError> {
        if let Some(hit) = self.categories.get(&()).await {
            return Ok(hit);
        }
        let links = Arc::new(CategoryRepository::new(pool).links().await?);
        self.categories.insert((), Arc::clone(&links)).await;
        Ok(links)
    }

    /// Drop the cached list after a catalog write.
    pub async fn invalidate(&self) {
        self.categories.invalidate(&()).await;
        tracing::debug!("Category cache invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalidate_clears_entry() {
        let cache = CatalogCache::new();
        cache
            .categories
            .insert(
                (),
                Arc::new(vec![CategoryLink {
                    name: "Poetry".to_string(),
                    slug: "poetry".to_string(),
                    book_count: 3,
                }]),
            )
            .await;
        assert!(cache.categories.get(&()).await.is_some());
        cache.invalidate().await;
        assert!(cache.categories.get(&()).await.is_none());
    }
}
