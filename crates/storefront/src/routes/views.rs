//! View models shared by several pages.
//!
//! Templates only print strings and booleans; prices, labels and stock
//! wording are worked out here.

use serde::Deserialize;

use bookbazar_core::BookLabel;

use crate::models::Book;

/// Books per page on `/products`.
pub const PRODUCTS_PER_PAGE: i64 = 12;

/// Books per page on the category pages.
pub const CATEGORY_PAGE_SIZE: i64 = 6;

/// A merchandising badge.
#[derive(Clone)]
pub struct LabelView {
    pub text: &'static str,
    pub css_class: &'static str,
}

impl From<BookLabel> for LabelView {
    fn from(label: BookLabel) -> Self {
        Self {
            text: label.label(),
            css_class: label.css_class(),
        }
    }
}

/// Book card used by listings, search results and related books.
#[derive(Clone)]
pub struct BookCardView {
    pub slug: String,
    pub title: String,
    pub author: String,
    pub cover_url: String,
    pub price: String,
    pub final_price: String,
    pub on_sale: bool,
    pub discount_percentage: u32,
    pub labels: Vec<LabelView>,
    pub in_stock: bool,
}

impl From<&Book> for BookCardView {
    fn from(book: &Book) -> Self {
        let pricing = book.pricing();
        Self {
            slug: book.slug.clone(),
            title: book.title.clone(),
            author: book.author_display().to_owned(),
            cover_url: book.cover_url().to_owned(),
            price: pricing.price.to_string(),
            final_price: pricing.final_price().to_string(),
            on_sale: pricing.is_on_sale(),
            discount_percentage: pricing.discount_percentage(),
            labels: book.labels().into_iter().map(LabelView::from).collect(),
            in_stock: book.can_purchase(),
        }
    }
}

/// Convert a slice of books to cards.
#[must_use]
pub fn cards(books: &[Book]) -> Vec<BookCardView> {
    books.iter().map(BookCardView::from).collect()
}

/// Highest page number accepted from the query string.
const MAX_PAGE: i64 = 100_000;

/// `?page=` query parameter. Non-numeric input is treated as page 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    #[must_use]
    pub fn requested(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .clamp(1, MAX_PAGE)
    }
}

/// Page links for a paginated listing.
#[derive(Clone)]
pub struct Pagination {
    pub page: i64,
    pub total_pages: i64,
    pub base_path: String,
}

impl Pagination {
    /// Clamp `requested` into `1..=total_pages`; out-of-range pages show the
    /// last page.
    #[must_use]
    pub fn new(requested: i64, total_items: i64, per_page: i64, base_path: &str) -> Self {
        let total_pages = ((total_items + per_page - 1) / per_page).max(1);
        Self {
            page: requested.clamp(1, total_pages),
            total_pages,
            base_path: base_path.to_owned(),
        }
    }

    /// SQL offset for the current page.
    #[must_use]
    pub const fn offset(&self, per_page: i64) -> i64 {
        (self.page - 1) * per_page
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[must_use]
    pub fn previous_url(&self) -> String {
        format!("{}?page={}", self.base_path, self.page - 1)
    }

    #[must_use]
    pub fn next_url(&self) -> String {
        format!("{}?page={}", self.base_path, self.page + 1)
    }
}

/// One `<option>` of a select box.
#[derive(Clone)]
pub struct ChoiceView {
    pub code: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Options for a select box built from `(code, label)` pairs.
pub fn choice_options(
    pairs: impl IntoIterator<Item = (&'static str, &'static str)>,
    selected: &str,
) -> Vec<ChoiceView> {
    let selected = selected.trim();
    pairs
        .into_iter()
        .map(|(code, label)| ChoiceView {
            code,
            label,
            selected: code == selected,
        })
        .collect()
}

/// Stock badge on the admin book list.
#[must_use]
pub fn stock_badge(stock: i32) -> (String, &'static str) {
    match stock {
        0 => ("Out of Stock".to_owned(), "stock-out"),
        n if n < 5 => (format!("Low ({n})"), "stock-low"),
        n if n < 10 => (format!("Medium ({n})"), "stock-medium"),
        n => (format!("Good ({n})"), "stock-good"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_clamps_pages() {
        let p = Pagination::new(9, 25, 12, "/products");
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.page, 3);
        assert_eq!(p.offset(12), 24);
        assert!(!p.has_next());
        assert_eq!(p.previous_url(), "/products?page=2");

        let p = Pagination::new(0, 0, 12, "/products");
        assert_eq!(p.total_pages, 1);
        assert_eq!(p.page, 1);
        assert!(!p.has_previous());
    }

    #[test]
    fn test_page_query_ignores_garbage() {
        let q = PageQuery {
            page: Some("abc".to_owned()),
        };
        assert_eq!(q.requested(), 1);
        let q = PageQuery {
            page: Some(" 4 ".to_owned()),
        };
        assert_eq!(q.requested(), 4);
    }

    #[test]
    fn test_choice_options_mark_selection() {
        let options = choice_options([("en", "English"), ("fr", "French")], " fr ");
        assert!(!options[0].selected);
        assert!(options[1].selected);
    }

    #[test]
    fn test_stock_badges() {
        assert_eq!(stock_badge(0).0, "Out of Stock");
        assert_eq!(stock_badge(3).0, "Low (3)");
        assert_eq!(stock_badge(7).0, "Medium (7)");
        assert_eq!(stock_badge(12).0, "Good (12)");
    }
}
