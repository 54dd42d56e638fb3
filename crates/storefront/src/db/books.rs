//! Book repository: catalog listing, search, staff editing, and stock.

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};

use bookbazar_core::{
    AuthorId, BookCondition, BookFormat, BookId, BookLabel, CategoryId, Genre, Money,
    PublisherId, slug_candidate, slugify,
};

use super::{RepositoryError, conflict_on_unique, like_pattern};
use crate::models::Book;

/// Columns of `Book`, with author/category/publisher names joined in.
const BOOK_SELECT: &str = r"
    SELECT b.id, b.title, b.slug, b.author_id, a.name AS author_name, a.slug AS author_slug,
           b.additional_authors, b.isbn, b.isbn13,
           b.category_id, c.name AS category_name, c.slug AS category_slug,
           b.genre, b.format, b.condition,
           b.publisher_id, p.name AS publisher_name,
           b.publication_date, b.edition, b.pages, b.language,
           b.price, b.discount_price, b.featured, b.label1, b.label2, b.label3,
           b.cover_image, b.description, b.excerpt, b.stock_quantity, b.is_available,
           b.created_at, b.updated_at
    FROM storefront.book b
    LEFT JOIN storefront.author a ON a.id = b.author_id
    LEFT JOIN storefront.category c ON c.id = b.category_id
    LEFT JOIN storefront.publisher p ON p.id = b.publisher_id
";

/// Validated book fields, with author and publisher already resolved.
#[derive(Debug, Clone)]
pub struct BookInput {
    pub title: String,
    pub author_id: Option<AuthorId>,
    pub additional_authors: String,
    pub isbn: Option<String>,
    pub isbn13: Option<String>,
    pub category_id: Option<CategoryId>,
    pub genre: Option<Genre>,
    pub format: BookFormat,
    pub condition: BookCondition,
    pub publisher_id: Option<PublisherId>,
    pub publication_date: Option<NaiveDate>,
    pub edition: String,
    pub pages: Option<i32>,
    pub language: String,
    pub price: Money,
    pub discount_price: Option<Money>,
    pub featured: bool,
    pub labels: [Option<BookLabel>; 3],
    pub cover_image: Option<String>,
    pub description: String,
    pub excerpt: String,
    pub stock_quantity: i32,
}

/// Filters for the advanced product search.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub query: String,
    pub category: Option<CategoryId>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
}

/// One row of the editable admin book list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRowUpdate {
    pub id: BookId,
    pub price: Money,
    pub stock_quantity: i32,
    pub featured: bool,
    pub is_available: bool,
}

/// Bulk actions from the admin book list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookAction {
    MakeFeatured,
    MakeUnfeatured,
    MarkAvailable,
    MarkUnavailable,
    IncreaseStock,
    ClearStock,
}

impl BookAction {
    const fn set_clause(self) -> &'static str {
        match self {
            Self::MakeFeatured => "featured = TRUE",
            Self::MakeUnfeatured => "featured = FALSE",
            Self::MarkAvailable => "is_available = TRUE",
            Self::MarkUnavailable => "is_available = FALSE",
            Self::IncreaseStock => "stock_quantity = stock_quantity + 10",
            Self::ClearStock => "stock_quantity = 0, is_available = FALSE",
        }
    }
}

/// Repository for book database operations.
pub struct BookRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BookRepository<'a> {
    /// Create a new book repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of all books, newest first, plus the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_page(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Book>, i64), RepositoryError> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "{BOOK_SELECT} ORDER BY b.created_at DESC, b.id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM storefront.book")
            .fetch_one(self.pool)
            .await?;

        Ok((books, total))
    }

    /// One page of a category's books, newest first, plus the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_category(
        &self,
        category: CategoryId,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Book>, i64), RepositoryError> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "{BOOK_SELECT} WHERE b.category_id = $1
             ORDER BY b.created_at DESC, b.id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(category)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM storefront.book WHERE category_id = $1",
        )
        .bind(category)
        .fetch_one(self.pool)
        .await?;

        Ok((books, total))
    }

    /// Books by one author, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_author(&self, author: AuthorId) -> Result<Vec<Book>, RepositoryError> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "{BOOK_SELECT} WHERE b.author_id = $1 ORDER BY b.created_at DESC, b.id DESC"
        ))
        .bind(author)
        .fetch_all(self.pool)
        .await?;
        Ok(books)
    }

    /// Featured books that are in stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: i64) -> Result<Vec<Book>, RepositoryError> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "{BOOK_SELECT} WHERE b.featured AND b.is_available
             ORDER BY b.created_at DESC, b.id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(books)
    }

    /// Other books from the same category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn related(&self, book: &Book, limit: i64) -> Result<Vec<Book>, RepositoryError> {
        let Some(category) = book.category_id else {
            return Ok(Vec::new());
        };
        let books = sqlx::query_as::<_, Book>(&format!(
            "{BOOK_SELECT} WHERE b.category_id = $1 AND b.id <> $2
             ORDER BY b.created_at DESC, b.id DESC LIMIT $3"
        ))
        .bind(category)
        .bind(book.id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(books)
    }

    /// Get a book by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Book>, RepositoryError> {
        let book = sqlx::query_as::<_, Book>(&format!("{BOOK_SELECT} WHERE b.slug = $1"))
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;
        Ok(book)
    }

    /// Quick search over title, description, author, ISBNs, and price text.
    ///
    /// An empty query matches every book.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, query: &str) -> Result<Vec<Book>, RepositoryError> {
        let pattern = like_pattern(query.trim());
        let books = sqlx::query_as::<_, Book>(&format!(
            r"{BOOK_SELECT}
            WHERE b.title ILIKE $1
               OR b.description ILIKE $1
               OR a.name ILIKE $1
               OR b.isbn ILIKE $1
               OR b.isbn13 ILIKE $1
               OR b.price::text ILIKE $1
            ORDER BY b.id"
        ))
        .bind(pattern)
        .fetch_all(self.pool)
        .await?;
        Ok(books)
    }

    /// Advanced search with category and price bounds.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_search(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Book>, RepositoryError> {
        let pattern = like_pattern(filter.query.trim());
        let books = sqlx::query_as::<_, Book>(&format!(
            r"{BOOK_SELECT}
            WHERE (b.title ILIKE $1
                   OR b.description ILIKE $1
                   OR a.name ILIKE $1
                   OR b.isbn ILIKE $1
                   OR c.name ILIKE $1)
              AND ($2::int IS NULL OR b.category_id = $2)
              AND ($3::numeric IS NULL OR b.price >= $3)
              AND ($4::numeric IS NULL OR b.price <= $4)
            ORDER BY b.created_at DESC, b.id DESC"
        ))
        .bind(pattern)
        .bind(filter.category)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .fetch_all(self.pool)
        .await?;
        Ok(books)
    }

    /// Staff list, optionally narrowed by title or ISBN.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn admin_list(&self, query: &str) -> Result<Vec<Book>, RepositoryError> {
        let pattern = like_pattern(query.trim());
        let books = sqlx::query_as::<_, Book>(&format!(
            r"{BOOK_SELECT}
            WHERE b.title ILIKE $1 OR a.name ILIKE $1 OR b.isbn ILIKE $1
            ORDER BY b.created_at DESC, b.id DESC"
        ))
        .bind(pattern)
        .fetch_all(self.pool)
        .await?;
        Ok(books)
    }

    /// Insert a book under a unique slug derived from its title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an ISBN clash or slug race occurs.
    pub async fn create(&self, input: &BookInput) -> Result<Book, RepositoryError> {
        let slug = self.unique_slug(&input.title).await?;

        let id = sqlx::query_scalar::<_, BookId>(
            r"
            INSERT INTO storefront.book (
                title, slug, author_id, additional_authors, isbn, isbn13, category_id,
                genre, format, condition, publisher_id, publication_date, edition, pages,
                language, price, discount_price, featured, label1, label2, label3,
                cover_image, description, excerpt, stock_quantity, is_available
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $25 > 0)
            RETURNING id
            ",
        )
        .bind(&input.title)
        .bind(&slug)
        .bind(input.author_id)
        .bind(&input.additional_authors)
        .bind(&input.isbn)
        .bind(&input.isbn13)
        .bind(input.category_id)
        .bind(input.genre)
        .bind(input.format)
        .bind(input.condition)
        .bind(input.publisher_id)
        .bind(input.publication_date)
        .bind(&input.edition)
        .bind(input.pages)
        .bind(&input.language)
        .bind(input.price)
        .bind(input.discount_price)
        .bind(input.featured)
        .bind(input.labels[0])
        .bind(input.labels[1])
        .bind(input.labels[2])
        .bind(&input.cover_image)
        .bind(&input.description)
        .bind(&input.excerpt)
        .bind(input.stock_quantity)
        .fetch_one(self.pool)
        .await
        .map_err(conflict_on_unique("book"))?;

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Overwrite a book's fields. The slug is kept so links stay valid.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the book does not exist.
    pub async fn update(&self, id: BookId, input: &BookInput) -> Result<Book, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.book SET
                title = $2, author_id = $3, additional_authors = $4, isbn = $5, isbn13 = $6,
                category_id = $7, genre = $8, format = $9, condition = $10,
                publisher_id = $11, publication_date = $12, edition = $13, pages = $14,
                language = $15, price = $16, discount_price = $17, featured = $18,
                label1 = $19, label2 = $20, label3 = $21, cover_image = $22,
                description = $23, excerpt = $24, stock_quantity = $25,
                is_available = $25 > 0, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&input.title)
        .bind(input.author_id)
        .bind(&input.additional_authors)
        .bind(&input.isbn)
        .bind(&input.isbn13)
        .bind(input.category_id)
        .bind(input.genre)
        .bind(input.format)
        .bind(input.condition)
        .bind(input.publisher_id)
        .bind(input.publication_date)
        .bind(&input.edition)
        .bind(input.pages)
        .bind(&input.language)
        .bind(input.price)
        .bind(input.discount_price)
        .bind(input.featured)
        .bind(input.labels[0])
        .bind(input.labels[1])
        .bind(input.labels[2])
        .bind(&input.cover_image)
        .bind(&input.description)
        .bind(&input.excerpt)
        .bind(input.stock_quantity)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a book.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the book does not exist.
    pub async fn delete(&self, id: BookId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.book WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Apply an admin bulk action; returns the number of books changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn apply_action(
        &self,
        action: BookAction,
        ids: &[i32],
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(&format!(
            "UPDATE storefront.book SET {}, updated_at = NOW() WHERE id = ANY($1)",
            action.set_clause()
        ))
        .bind(ids)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Save edited list rows in one transaction; returns the number of books
    /// changed. A book with no stock is saved as unavailable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if an update fails; nothing is
    /// saved in that case.
    pub async fn save_rows(&self, rows: &[BookRowUpdate]) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut changed = 0;
        for row in rows {
            let result = sqlx::query(
                r"
                UPDATE storefront.book
                SET price = $2, stock_quantity = $3, featured = $4,
                    is_available = $5 AND $3 > 0, updated_at = NOW()
                WHERE id = $1
                  AND (price, stock_quantity, featured, is_available)
                      IS DISTINCT FROM ($2, $3, $4, $5 AND $3 > 0)
                ",
            )
            .bind(row.id)
            .bind(row.price)
            .bind(row.stock_quantity)
            .bind(row.featured)
            .bind(row.is_available)
            .execute(&mut *tx)
            .await?;
            changed += result.rows_affected();
        }
        tx.commit().await?;
        Ok(changed)
    }

    /// Count books, and books with fewer than five copies.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stock_counts(&self) -> Result<(i64, i64), RepositoryError> {
        let counts = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE stock_quantity < 5) FROM storefront.book",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(counts)
    }

    async fn get_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let book = sqlx::query_as::<_, Book>(&format!("{BOOK_SELECT} WHERE b.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(book)
    }

    /// First free slug among `base`, `base-1`, `base-2`, ...
    async fn unique_slug(&self, title: &str) -> Result<String, RepositoryError> {
        let base = slugify(title);
        let mut n = 0;
        loop {
            let candidate = slug_candidate(&base, n);
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM storefront.book WHERE slug = $1)",
            )
            .bind(&candidate)
            .fetch_one(self.pool)
            .await?;
            if !taken {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}

/// Take `quantity` copies out of stock if the book is still on sale and
/// that many remain.
///
/// Returns `false` and changes nothing when stock is short or staff marked
/// the book unavailable. Runs on the caller's transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn reserve_stock(
    conn: &mut PgConnection,
    book: BookId,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE storefront.book
        SET stock_quantity = stock_quantity - $2,
            is_available = stock_quantity - $2 > 0,
            updated_at = NOW()
        WHERE id = $1 AND is_available AND stock_quantity >= $2
        ",
    )
    .bind(book)
    .bind(quantity)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
