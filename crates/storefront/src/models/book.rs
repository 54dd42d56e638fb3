//! Catalog domain types.

use chrono::{DateTime, NaiveDate, Utc};

use bookbazar_core::{
    AuthorId, BookCondition, BookFormat, BookId, BookImageId, BookLabel, BookPricing, CategoryId,
    Genre, Money, PublisherId, ReviewId, UserId,
};

/// Cover shown when a book has no uploaded image.
pub const PLACEHOLDER_COVER: &str = "/static/images/placeholder-book.svg";

/// A book with its author, category, and publisher names joined in.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub slug: String,
    pub author_id: Option<AuthorId>,
    pub author_name: Option<String>,
    pub author_slug: Option<String>,
    pub additional_authors: String,
    pub isbn: Option<String>,
    pub isbn13: Option<String>,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub genre: Option<Genre>,
    pub format: BookFormat,
    pub condition: BookCondition,
    pub publisher_id: Option<PublisherId>,
    pub publisher_name: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub edition: String,
    pub pages: Option<i32>,
    pub language: String,
    pub price: Money,
    pub discount_price: Option<Money>,
    pub featured: bool,
    pub label1: Option<BookLabel>,
    pub label2: Option<BookLabel>,
    pub label3: Option<BookLabel>,
    pub cover_image: Option<String>,
    pub description: String,
    pub excerpt: String,
    pub stock_quantity: i32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    #[must_use]
    pub const fn pricing(&self) -> BookPricing {
        BookPricing::new(self.price, self.discount_price)
    }

    /// Labels set on the book, in slot order.
    #[must_use]
    pub fn labels(&self) -> Vec<BookLabel> {
        [self.label1, self.label2, self.label3]
            .into_iter()
            .flatten()
            .collect()
    }

    #[must_use]
    pub fn cover_url(&self) -> &str {
        self.cover_image.as_deref().unwrap_or(PLACEHOLDER_COVER)
    }

    /// Whether a copy can be put in a cart right now.
    #[must_use]
    pub const fn can_purchase(&self) -> bool {
        self.is_available && self.stock_quantity > 0
    }

    #[must_use]
    pub fn author_display(&self) -> &str {
        self.author_name.as_deref().unwrap_or("Unknown author")
    }
}

/// A category row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub parent_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
}

/// Category with the counts shown on listing pages.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub parent_id: Option<CategoryId>,
    pub book_count: i64,
    pub children_count: i64,
}

/// Sidebar entry: a category and its available-book count.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryLink {
    pub name: String,
    pub slug: String,
    pub book_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub slug: String,
    pub bio: String,
    /// Public path of the uploaded photo.
    pub image: Option<String>,
}

/// One picture in a book's gallery.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookImage {
    pub id: BookImageId,
    pub book_id: BookId,
    pub image: String,
    pub caption: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Publisher {
    pub id: PublisherId,
    pub name: String,
    pub website: Option<String>,
    pub description: String,
}

/// A customer review of a book.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub book_id: BookId,
    pub book_title: String,
    pub user_id: UserId,
    pub user_email: String,
    pub rating: i16,
    pub title: String,
    pub comment: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Rating as filled and empty stars, e.g. `★★★☆☆`.
    #[must_use]
    pub fn stars(&self) -> String {
        stars(self.rating)
    }
}

/// Render a 1..=5 rating as five stars.
#[must_use]
pub fn stars(rating: i16) -> String {
    let filled = usize::try_from(rating.clamp(0, 5)).unwrap_or(0);
    let mut out = "★".repeat(filled);
    out.push_str(&"☆".repeat(5 - filled));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stars() {
        assert_eq!(stars(4), "★★★★☆");
        assert_eq!(stars(5), "★★★★★");
        assert_eq!(stars(1), "★☆☆☆☆");
    }
}
