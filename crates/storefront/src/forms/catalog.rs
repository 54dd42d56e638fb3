//! Staff product/category forms and the shopper-facing search and review forms.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use bookbazar_core::{BookCondition, BookFormat, BookLabel, CategoryId, Genre, Money};

use super::{FieldErrors, REQUIRED, checked, non_blank};
use crate::db::books::{BookInput, ProductFilter};
use crate::models::Book;

/// Digits of an ISBN with dashes and spaces removed.
fn isbn_digits(raw: &str) -> String {
    raw.chars().filter(|c| !matches!(c, '-' | ' ')).collect()
}

fn parse_money(raw: &str) -> Option<Money> {
    Decimal::from_str(raw.trim()).ok().map(|d| Money::new(d).round_cents())
}

/// Optional choice field: blank is `None`, unknown codes are an error.
fn optional_choice<T: FromStr>(errors: &mut FieldErrors, field: &'static str, raw: &str) -> Option<T> {
    let raw = non_blank(raw)?;
    raw.parse().map_or_else(
        |_| {
            errors.add(field, "Select a valid choice.");
            None
        },
        Some,
    )
}

/// Longest gallery image caption.
pub const MAX_CAPTION_CHARS: usize = 200;

/// Trimmed caption for a batch of gallery uploads.
///
/// # Errors
///
/// Returns the message for a caption over [`MAX_CAPTION_CHARS`].
pub fn gallery_caption(raw: &str) -> Result<String, &'static str> {
    let caption = raw.trim();
    if caption.chars().count() > MAX_CAPTION_CHARS {
        return Err("Caption must be at most 200 characters.");
    }
    Ok(caption.to_owned())
}

/// Product add/edit form, filled from multipart text parts.
#[derive(Debug, Default, Clone)]
pub struct ProductForm {
    pub title: String,
    pub author_name: String,
    pub additional_authors: String,
    pub isbn: String,
    pub isbn13: String,
    pub category: String,
    pub genre: String,
    pub format: String,
    pub condition: String,
    pub publisher_name: String,
    pub publication_date: String,
    pub edition: String,
    pub pages: String,
    pub language: String,
    pub price: String,
    pub discount_price: String,
    pub stock_quantity: String,
    pub featured: Option<String>,
    pub label1: String,
    pub label2: String,
    pub label3: String,
    pub description: String,
    pub excerpt: String,
}

/// A validated product form; author and publisher still need resolving.
#[derive(Debug, Clone)]
pub struct ProductData {
    pub author_name: String,
    pub publisher_name: Option<String>,
    pub book: BookInput,
}

impl ProductForm {
    /// Set a field from a multipart text part. Unknown names are ignored.
    pub fn set(&mut self, name: &str, value: String) {
        let slot = match name {
            "title" => &mut self.title,
            "author_name" => &mut self.author_name,
            "additional_authors" => &mut self.additional_authors,
            "isbn" => &mut self.isbn,
            "isbn13" => &mut self.isbn13,
            "category" => &mut self.category,
            "genre" => &mut self.genre,
            "format" => &mut self.format,
            "condition" => &mut self.condition,
            "publisher_name" => &mut self.publisher_name,
            "publication_date" => &mut self.publication_date,
            "edition" => &mut self.edition,
            "pages" => &mut self.pages,
            "language" => &mut self.language,
            "price" => &mut self.price,
            "discount_price" => &mut self.discount_price,
            "stock_quantity" => &mut self.stock_quantity,
            "label1" => &mut self.label1,
            "label2" => &mut self.label2,
            "label3" => &mut self.label3,
            "description" => &mut self.description,
            "excerpt" => &mut self.excerpt,
            "featured" => {
                self.featured = Some(value);
                return;
            }
            _ => return,
        };
        *slot = value;
    }

    /// Pre-fill from an existing book for the edit page.
    #[must_use]
    pub fn from_book(book: &Book) -> Self {
        let code = |label: Option<BookLabel>| label.map(|l| l.as_str().to_owned()).unwrap_or_default();
        Self {
            title: book.title.clone(),
            author_name: book.author_name.clone().unwrap_or_default(),
            additional_authors: book.additional_authors.clone(),
            isbn: book.isbn.clone().unwrap_or_default(),
            isbn13: book.isbn13.clone().unwrap_or_default(),
            category: book.category_id.map(|c| c.to_string()).unwrap_or_default(),
            genre: book.genre.map(|g| g.as_str().to_owned()).unwrap_or_default(),
            format: book.format.as_str().to_owned(),
            condition: book.condition.as_str().to_owned(),
            publisher_name: book.publisher_name.clone().unwrap_or_default(),
            publication_date: book
                .publication_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            edition: book.edition.clone(),
            pages: book.pages.map(|p| p.to_string()).unwrap_or_default(),
            language: book.language.clone(),
            price: book.price.to_plain_string(),
            discount_price: book
                .discount_price
                .map(|d| d.to_plain_string())
                .unwrap_or_default(),
            stock_quantity: book.stock_quantity.to_string(),
            featured: book.featured.then(|| "on".to_owned()),
            label1: code(book.label1),
            label2: code(book.label2),
            label3: code(book.label3),
            description: book.description.clone(),
            excerpt: book.excerpt.clone(),
        }
    }

    #[must_use]
    pub fn is_featured(&self) -> bool {
        checked(self.featured.as_deref())
    }

    /// # Errors
    ///
    /// Returns per-field messages for every rule the input breaks.
    #[allow(clippy::too_many_lines)]
    pub fn validate(&self) -> Result<ProductData, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", "Title is required.");
        } else if title.chars().count() < 2 {
            errors.add("title", "Title must be at least 2 characters long.");
        }

        let author_name = self.author_name.trim();
        if author_name.is_empty() {
            errors.add("author_name", "Author is required.");
        } else if author_name.chars().count() < 2 {
            errors.add("author_name", "Author name must be at least 2 characters long.");
        }

        let isbn = non_blank(&self.isbn).map(isbn_digits);
        if let Some(ref isbn) = isbn
            && (!isbn.bytes().all(|b| b.is_ascii_digit()) || !matches!(isbn.len(), 10 | 13))
        {
            errors.add("isbn", "ISBN must be 10 or 13 digits long.");
        }
        let isbn13 = non_blank(&self.isbn13).map(isbn_digits);
        if let Some(ref isbn13) = isbn13
            && (!isbn13.bytes().all(|b| b.is_ascii_digit()) || isbn13.len() != 13)
        {
            errors.add("isbn13", "ISBN-13 must be exactly 13 digits long.");
        }

        let category_id = match non_blank(&self.category) {
            None => None,
            Some(raw) => raw.parse::<i32>().map(CategoryId::new).map_or_else(
                |_| {
                    errors.add("category", "Select a valid choice.");
                    None
                },
                Some,
            ),
        };

        let genre = optional_choice::<Genre>(&mut errors, "genre", &self.genre);
        let format =
            optional_choice::<BookFormat>(&mut errors, "format", &self.format).unwrap_or_default();
        let condition = optional_choice::<BookCondition>(&mut errors, "condition", &self.condition)
            .unwrap_or_default();
        let labels = [
            optional_choice::<BookLabel>(&mut errors, "label1", &self.label1),
            optional_choice::<BookLabel>(&mut errors, "label2", &self.label2),
            optional_choice::<BookLabel>(&mut errors, "label3", &self.label3),
        ];

        let publication_date = match non_blank(&self.publication_date) {
            None => None,
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_or_else(
                |_| {
                    errors.add("publication_date", "Enter a valid date.");
                    None
                },
                Some,
            ),
        };

        let pages = match non_blank(&self.pages) {
            None => None,
            Some(raw) => match raw.parse::<i32>() {
                Ok(n) if n > 0 => Some(n),
                Ok(_) => {
                    errors.add("pages", "Number of pages must be greater than 0.");
                    None
                }
                Err(_) => {
                    errors.add("pages", "Enter a whole number.");
                    None
                }
            },
        };

        let price = match non_blank(&self.price) {
            None => {
                errors.add("price", REQUIRED);
                None
            }
            Some(raw) => match parse_money(raw) {
                Some(p) if p.is_positive() => Some(p),
                Some(_) => {
                    errors.add("price", "Price must be greater than 0.");
                    None
                }
                None => {
                    errors.add("price", "Enter a number.");
                    None
                }
            },
        };

        let discount_price = match non_blank(&self.discount_price) {
            None => None,
            Some(raw) => match parse_money(raw) {
                Some(d) if !d.is_positive() => {
                    errors.add("discount_price", "Discount price must be greater than 0.");
                    None
                }
                Some(d) if price.is_some_and(|p| d >= p) => {
                    errors.add(
                        "discount_price",
                        "Discount price must be less than regular price.",
                    );
                    None
                }
                Some(d) => Some(d),
                None => {
                    errors.add("discount_price", "Enter a number.");
                    None
                }
            },
        };

        let stock_quantity = match non_blank(&self.stock_quantity) {
            None => 0,
            Some(raw) => match raw.parse::<i32>() {
                Ok(n) if n >= 0 => n,
                Ok(_) => {
                    errors.add("stock_quantity", "Stock quantity cannot be negative.");
                    0
                }
                Err(_) => {
                    errors.add("stock_quantity", "Enter a whole number.");
                    0
                }
            },
        };

        let description = self.description.trim();
        if description.is_empty() {
            errors.add("description", "Description is required.");
        } else if description.chars().count() < 10 {
            errors.add(
                "description",
                "Description must be at least 10 characters long.",
            );
        }

        let Some(price) = price else {
            return Err(errors);
        };

        errors.finish(ProductData {
            author_name: author_name.to_owned(),
            publisher_name: non_blank(&self.publisher_name).map(str::to_owned),
            book: BookInput {
                title: title.to_owned(),
                author_id: None,
                additional_authors: self.additional_authors.trim().to_owned(),
                isbn,
                isbn13,
                category_id,
                genre,
                format,
                condition,
                publisher_id: None,
                publication_date,
                edition: self.edition.trim().to_owned(),
                pages,
                language: non_blank(&self.language).unwrap_or("English").to_owned(),
                price,
                discount_price,
                featured: self.is_featured(),
                labels,
                cover_image: None,
                description: description.to_owned(),
                excerpt: self.excerpt.trim().to_owned(),
                stock_quantity,
            },
        })
    }
}

/// Staff author page: biography and photo, filled from multipart text parts.
#[derive(Debug, Default, Clone)]
pub struct AuthorForm {
    pub bio: String,
    pub remove_photo: Option<String>,
}

impl AuthorForm {
    pub fn set(&mut self, name: &str, value: String) {
        match name {
            "bio" => self.bio = value,
            "remove_photo" => self.remove_photo = Some(value),
            _ => {}
        }
    }

    #[must_use]
    pub fn removes_photo(&self) -> bool {
        checked(self.remove_photo.as_deref())
    }
}

/// New category form.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent: String,
}

/// A validated category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryData {
    pub name: String,
    pub description: String,
    pub parent: Option<CategoryId>,
}

impl CategoryForm {
    /// # Errors
    ///
    /// Returns field errors for a short name or bad parent id.
    pub fn validate(&self) -> Result<CategoryData, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Category name is required.");
        } else if name.chars().count() < 2 {
            errors.add("name", "Category name must be at least 2 characters long.");
        }
        let parent = match non_blank(&self.parent) {
            None => None,
            Some(raw) => raw.parse::<i32>().map(CategoryId::new).map_or_else(
                |_| {
                    errors.add("parent", "Select a valid choice.");
                    None
                },
                Some,
            ),
        };
        errors.finish(CategoryData {
            name: name.to_owned(),
            description: self.description.trim().to_owned(),
            parent,
        })
    }
}

/// Advanced search query string.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProductSearchForm {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub min_price: String,
    #[serde(default)]
    pub max_price: String,
}

impl ProductSearchForm {
    /// # Errors
    ///
    /// Returns field errors for negative or unparseable prices, and a
    /// form-wide error when the minimum exceeds the maximum.
    pub fn validate(&self) -> Result<ProductFilter, FieldErrors> {
        let mut errors = FieldErrors::new();

        let mut bound = |field: &'static str, raw: &str| -> Option<Money> {
            let raw = non_blank(raw)?;
            match parse_money(raw) {
                Some(m) if m.amount().is_sign_negative() => {
                    errors.add(field, "Ensure this value is greater than or equal to 0.");
                    None
                }
                Some(m) => Some(m),
                None => {
                    errors.add(field, "Enter a number.");
                    None
                }
            }
        };
        let min_price = bound("min_price", &self.min_price);
        let max_price = bound("max_price", &self.max_price);

        if let (Some(min), Some(max)) = (min_price, max_price)
            && min > max
        {
            errors.add(
                FieldErrors::FORM,
                "Minimum price cannot be greater than maximum price.",
            );
        }

        let category = non_blank(&self.category)
            .and_then(|raw| raw.parse::<i32>().ok())
            .map(CategoryId::new);

        errors.finish(ProductFilter {
            query: self.query.trim().to_owned(),
            category,
            min_price,
            max_price,
        })
    }
}

/// Review form on the product page.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub comment: String,
}

/// A validated review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewData {
    pub rating: i16,
    pub title: String,
    pub comment: String,
}

impl ReviewForm {
    /// # Errors
    ///
    /// Returns a field error when the rating is missing or out of range.
    pub fn validate(&self) -> Result<ReviewData, FieldErrors> {
        let mut errors = FieldErrors::new();
        let rating = match self.rating.trim().parse::<i16>() {
            Ok(r) if (1..=5).contains(&r) => r,
            _ => {
                errors.add("rating", "Please select a rating.");
                0
            }
        };
        let title = self.title.trim();
        if title.chars().count() > 200 {
            errors.add("title", "Ensure this value has at most 200 characters.");
        }
        errors.finish(ReviewData {
            rating,
            title: title.to_owned(),
            comment: self.comment.trim().to_owned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_product() -> ProductForm {
        ProductForm {
            title: "The Left Hand of Darkness".to_owned(),
            author_name: "Ursula K. Le Guin".to_owned(),
            price: "18.50".to_owned(),
            stock_quantity: "4".to_owned(),
            description: "An envoy visits the planet Gethen.".to_owned(),
            ..ProductForm::default()
        }
    }

    #[test]
    fn test_valid_product_defaults() {
        let data = valid_product().validate().unwrap();
        assert_eq!(data.author_name, "Ursula K. Le Guin");
        assert_eq!(data.book.format, BookFormat::Paperback);
        assert_eq!(data.book.condition, BookCondition::New);
        assert_eq!(data.book.language, "English");
        assert_eq!(data.book.price, Money::from_cents(1850));
        assert_eq!(data.book.stock_quantity, 4);
        assert_eq!(data.publisher_name, None);
    }

    #[test]
    fn test_gallery_caption_length() {
        assert_eq!(gallery_caption("  Signed first page ").unwrap(), "Signed first page");
        assert_eq!(gallery_caption(&"é".repeat(MAX_CAPTION_CHARS)).unwrap().chars().count(), 200);
        assert_eq!(
            gallery_caption(&"x".repeat(MAX_CAPTION_CHARS + 1)),
            Err("Caption must be at most 200 characters.")
        );
    }

    #[test]
    fn test_author_form_photo_removal() {
        let mut form = AuthorForm::default();
        form.set("bio", "Born in Berkeley.".to_owned());
        assert!(!form.removes_photo());
        form.set("remove_photo", "on".to_owned());
        assert!(form.removes_photo());
        assert_eq!(form.bio, "Born in Berkeley.");
    }

    #[test]
    fn test_isbn_rules() {
        let mut form = valid_product();
        form.isbn = "978-0-441-47812".to_owned();
        form.isbn13 = "0441478123".to_owned();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("isbn"), Some("ISBN must be 10 or 13 digits long."));
        assert_eq!(
            errors.get("isbn13"),
            Some("ISBN-13 must be exactly 13 digits long.")
        );

        form.isbn = "0 441 47812 3".to_owned();
        form.isbn13 = "978-0-441-47812-5".to_owned();
        let data = form.validate().unwrap();
        assert_eq!(data.book.isbn.as_deref(), Some("0441478123"));
        assert_eq!(data.book.isbn13.as_deref(), Some("9780441478125"));
    }

    #[test]
    fn test_price_rules() {
        let mut form = valid_product();
        form.price = "0".to_owned();
        assert_eq!(
            form.validate().unwrap_err().get("price"),
            Some("Price must be greater than 0.")
        );

        let mut form = valid_product();
        form.discount_price = "18.50".to_owned();
        assert_eq!(
            form.validate().unwrap_err().get("discount_price"),
            Some("Discount price must be less than regular price.")
        );

        form.discount_price = "-1".to_owned();
        assert_eq!(
            form.validate().unwrap_err().get("discount_price"),
            Some("Discount price must be greater than 0.")
        );

        let mut form = valid_product();
        form.stock_quantity = "-3".to_owned();
        assert_eq!(
            form.validate().unwrap_err().get("stock_quantity"),
            Some("Stock quantity cannot be negative.")
        );
    }

    #[test]
    fn test_short_description_and_title() {
        let mut form = valid_product();
        form.title = "X".to_owned();
        form.description = "Too short".to_owned();
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get("title"),
            Some("Title must be at least 2 characters long.")
        );
        assert_eq!(
            errors.get("description"),
            Some("Description must be at least 10 characters long.")
        );
    }

    #[test]
    fn test_labels_parse_codes() {
        let mut form = valid_product();
        form.set("label1", "B".to_owned());
        form.set("label3", "Z".to_owned());
        let errors = form.validate().unwrap_err();
        assert!(errors.has("label3"));

        form.set("label3", String::new());
        let data = form.validate().unwrap();
        assert_eq!(data.book.labels, [Some(BookLabel::Bestseller), None, None]);
    }

    #[test]
    fn test_search_price_order() {
        let form = ProductSearchForm {
            min_price: "30".to_owned(),
            max_price: "10".to_owned(),
            ..ProductSearchForm::default()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.form(),
            vec!["Minimum price cannot be greater than maximum price."]
        );

        let form = ProductSearchForm {
            min_price: "-1".to_owned(),
            ..ProductSearchForm::default()
        };
        assert!(form.validate().unwrap_err().has("min_price"));

        let form = ProductSearchForm {
            query: " dune ".to_owned(),
            category: "3".to_owned(),
            min_price: "5".to_owned(),
            ..ProductSearchForm::default()
        };
        let filter = form.validate().unwrap();
        assert_eq!(filter.query, "dune");
        assert_eq!(filter.category, Some(CategoryId::new(3)));
        assert_eq!(filter.min_price, Some(Money::from_cents(500)));
        assert_eq!(filter.max_price, None);
    }

    #[test]
    fn test_review_rating_range() {
        let form = ReviewForm {
            rating: "6".to_owned(),
            ..ReviewForm::default()
        };
        assert_eq!(
            form.validate().unwrap_err().get("rating"),
            Some("Please select a rating.")
        );
        let form = ReviewForm {
            rating: "4".to_owned(),
            title: "Loved it".to_owned(),
            comment: String::new(),
        };
        assert_eq!(form.validate().unwrap().rating, 4);
    }

    #[test]
    fn test_category_name_rules() {
        let form = CategoryForm {
            name: "S".to_owned(),
            ..CategoryForm::default()
        };
        assert_eq!(
            form.validate().unwrap_err().get("name"),
            Some("Category name must be at least 2 characters long.")
        );
    }
}
